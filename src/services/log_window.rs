//! Resolution of caller-facing log windows into UTC instants and cache prefixes.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::warn;

const END_OF_DAY: &str = "23:59:59";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("Invalid day format: '{0}'. Use YYYYMMDD.")]
    InvalidDay(String),

    #[error("Invalid end timestamp format: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid time window: {0} hours")]
    InvalidWindow(f64),

    #[error("{timestamp} does not exist in {timezone}")]
    NonexistentLocalTime { timestamp: String, timezone: String },
}

/// "The last `hours_ago` hours", optionally on another calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativeWindow {
    pub hours_ago: u32,
    /// `YYYYMMDD`; replaces the date of "now" while keeping its time of day.
    pub day: Option<String>,
}

impl Default for RelativeWindow {
    fn default() -> Self {
        Self {
            hours_ago: 1,
            day: None,
        }
    }
}

impl RelativeWindow {
    /// Window of `hours_ago` hours ending now, or at this time of day on `day`.
    pub fn new(hours_ago: u32, day: Option<String>) -> Self {
        Self { hours_ago, day }
    }

    pub fn resolve(&self, now: DateTime<Utc>) -> Result<ResolvedWindow, WindowError> {
        let (end, day) = match self.day.as_deref() {
            Some(day) => {
                let date = NaiveDate::parse_from_str(day, "%Y%m%d")
                    .map_err(|_| WindowError::InvalidDay(day.to_string()))?;
                (date.and_time(now.time()).and_utc(), day.to_string())
            }
            None => (now, now.format("%Y%m%d").to_string()),
        };
        let start = TimeDelta::try_hours(i64::from(self.hours_ago))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(WindowError::InvalidWindow(f64::from(self.hours_ago)))?;

        Ok(ResolvedWindow {
            start,
            end,
            cache_prefix: format!("{day}_h{}", self.hours_ago),
        })
    }
}

/// A window of `window_hours` ending at a wall-clock instant in a named zone.
#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    /// `YYYY-MM-DD`
    pub end_date: String,
    /// `HH:MM:SS` or `HH:MM`; end of day when absent.
    pub end_time: Option<String>,
    /// IANA zone name; UTC when absent or unknown.
    pub timezone: Option<String>,
    pub window_hours: f64,
}

impl DateWindow {
    pub fn new(end_date: impl Into<String>, window_hours: f64) -> Self {
        Self {
            end_date: end_date.into(),
            end_time: None,
            timezone: None,
            window_hours,
        }
    }

    #[must_use]
    pub fn at(mut self, end_time: impl Into<String>) -> Self {
        self.end_time = Some(end_time.into());
        self
    }

    #[must_use]
    pub fn in_zone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    /// Zone the end instant is interpreted in.
    pub fn effective_zone(&self) -> Tz {
        match self.timezone.as_deref().map(str::trim) {
            None | Some("" | "UTC") => Tz::UTC,
            Some(name) => name.parse::<Tz>().unwrap_or_else(|_| {
                warn!(timezone = name, "unknown timezone, using UTC instead");
                Tz::UTC
            }),
        }
    }

    pub fn resolve(&self) -> Result<ResolvedWindow, WindowError> {
        let time_text = self.end_time.as_deref().unwrap_or(END_OF_DAY);
        let timestamp = format!("{}T{time_text}", self.end_date);
        let date = NaiveDate::parse_from_str(&self.end_date, "%Y-%m-%d")
            .map_err(|_| WindowError::InvalidTimestamp(timestamp.clone()))?;
        let time = NaiveTime::parse_from_str(time_text, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(time_text, "%H:%M"))
            .map_err(|_| WindowError::InvalidTimestamp(timestamp.clone()))?;

        if !self.window_hours.is_finite() || self.window_hours <= 0.0 {
            return Err(WindowError::InvalidWindow(self.window_hours));
        }
        #[allow(clippy::cast_possible_truncation)]
        let window_ms = (self.window_hours * 3_600_000.0).round() as i64;
        let window = TimeDelta::try_milliseconds(window_ms)
            .ok_or(WindowError::InvalidWindow(self.window_hours))?;

        let zone = self.effective_zone();
        let end = zone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .ok_or_else(|| WindowError::NonexistentLocalTime {
                timestamp: timestamp.clone(),
                timezone: zone.name().to_string(),
            })?
            .with_timezone(&Utc);
        let start = end
            .checked_sub_signed(window)
            .ok_or(WindowError::InvalidWindow(self.window_hours))?;

        let mut cache_prefix = format!("{}_h{:?}", self.end_date, self.window_hours);
        if self.end_time.is_some() {
            cache_prefix.push_str(&format!("_t{}", time.format("%H%M%S")));
        }
        if zone != Tz::UTC {
            cache_prefix.push_str(&format!("_z{}", zone.name().replace('/', "-")));
        }

        Ok(ResolvedWindow {
            start,
            end,
            cache_prefix,
        })
    }
}

/// Concrete UTC bounds plus the log file prefix they are cached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub cache_prefix: String,
}
