//! Log entries and the time-windowed query used to fetch them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::plain_value::PlainValue;

/// Cloud Logging severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Default,
    Debug,
    Info,
    Notice,
    Warning,
    Error,
    Critical,
    Alert,
    Emergency,
}

impl Severity {
    /// Upper-case name used in filters and log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Notice => "NOTICE",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
            Self::Alert => "ALERT",
            Self::Emergency => "EMERGENCY",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEFAULT" => Ok(Self::Default),
            "DEBUG" => Ok(Self::Debug),
            "INFO" => Ok(Self::Info),
            "NOTICE" => Ok(Self::Notice),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "ERROR" => Ok(Self::Error),
            "CRITICAL" => Ok(Self::Critical),
            "ALERT" => Ok(Self::Alert),
            "EMERGENCY" => Ok(Self::Emergency),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// Body of a log entry.
#[derive(Debug, Clone, PartialEq)]
pub enum LogPayload {
    Empty,
    Text(String),
    Structured(PlainValue),
}

/// One log line as returned by the logging API.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub payload: LogPayload,
}

impl LogEntry {
    pub fn text(timestamp: DateTime<Utc>, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            timestamp,
            severity,
            payload: LogPayload::Text(text.into()),
        }
    }

    /// `{timestamp} [{SEVERITY}] {payload}`; structured payloads as compact JSON.
    pub fn render(&self) -> String {
        let mut line = format!(
            "{} [{}] ",
            self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false),
            self.severity
        );
        match &self.payload {
            LogPayload::Empty => {}
            LogPayload::Text(text) => line.push_str(text),
            LogPayload::Structured(value) => line.push_str(&value.to_string()),
        }
        line
    }
}

/// Time-windowed log query for one revision.
///
/// Entries are always requested newest first so that `page_size` keeps the
/// most recent ones.
#[derive(Debug, Clone, PartialEq)]
pub struct LogQuery {
    pub tenant_id: String,
    pub location: String,
    pub resource_name: String,
    pub sub_resource_name: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub min_severity: Severity,
    pub page_size: usize,
}

impl LogQuery {
    /// Cloud Logging filter expression for this query.
    pub fn filter(&self) -> String {
        format!(
            "resource.type=\"cloud_run_revision\" \
             resource.labels.project_id=\"{}\" \
             resource.labels.location=\"{}\" \
             resource.labels.service_name=\"{}\" \
             resource.labels.revision_name=\"{}\" \
             timestamp >= \"{}\" \
             timestamp <= \"{}\" \
             severity>={}",
            self.tenant_id,
            self.location,
            self.resource_name,
            self.sub_resource_name,
            self.start.to_rfc3339(),
            self.end.to_rfc3339(),
            self.min_severity
        )
    }

    /// Whether an entry falls inside the window and passes the severity floor.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        entry.timestamp >= self.start && entry.timestamp <= self.end && entry.severity >= self.min_severity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_severity_order_and_parse() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Default < Severity::Debug);
        assert_eq!("warning".parse::<Severity>(), Ok(Severity::Warning));
        assert_eq!("EMERGENCY".parse::<Severity>(), Ok(Severity::Emergency));
        assert!("LOUD".parse::<Severity>().is_err());
    }

    #[test]
    fn test_render_text_and_structured() {
        let text = LogEntry::text(at(10, 0), Severity::Error, "boom");
        assert_eq!(text.render(), "2024-05-01T10:00:00+00:00 [ERROR] boom");

        let structured = LogEntry {
            timestamp: at(10, 1),
            severity: Severity::Warning,
            payload: LogPayload::Structured(PlainValue::from(serde_json::json!({"code": 7}))),
        };
        assert_eq!(structured.render(), "2024-05-01T10:01:00+00:00 [WARNING] {\"code\":7}");

        let empty = LogEntry {
            timestamp: at(10, 2),
            severity: Severity::Info,
            payload: LogPayload::Empty,
        };
        assert_eq!(empty.render(), "2024-05-01T10:02:00+00:00 [INFO] ");
    }

    #[test]
    fn test_filter_and_matches() {
        let query = LogQuery {
            tenant_id: "acme".to_string(),
            location: "us-central1".to_string(),
            resource_name: "api".to_string(),
            sub_resource_name: "api-00001".to_string(),
            start: at(9, 0),
            end: at(10, 0),
            min_severity: Severity::Warning,
            page_size: 100,
        };

        let filter = query.filter();
        assert!(filter.starts_with("resource.type=\"cloud_run_revision\""));
        assert!(filter.contains("resource.labels.revision_name=\"api-00001\""));
        assert!(filter.ends_with("severity>=WARNING"));

        assert!(query.matches(&LogEntry::text(at(9, 30), Severity::Error, "x")));
        assert!(!query.matches(&LogEntry::text(at(9, 30), Severity::Info, "x")));
        assert!(!query.matches(&LogEntry::text(at(10, 1), Severity::Error, "x")));
    }
}
