//! Tagged outcome of a read-through call and its tool-facing rendering.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;

use super::plain_value::PlainValue;

/// Where a result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FetchStatus {
    /// A fresh cache entry was used.
    #[serde(rename = "success_cache")]
    FromCache,
    /// The data source was called and the result written through.
    #[serde(rename = "success_api")]
    FromSource,
    /// Nothing usable was produced.
    #[serde(rename = "error")]
    Error,
}

impl FetchStatus {
    /// Wire spelling used in tool responses.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FromCache => "success_cache",
            Self::FromSource => "success_api",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one orchestrated accessor call. Always fully formed.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    /// Served from a fresh cache entry.
    FromCache(PlainValue),
    /// Served from the data source.
    FromSource(PlainValue),
    /// The call failed; the message is meant for the calling agent.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl FetchResult {
    /// Build an error result.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Status tag.
    pub const fn status(&self) -> FetchStatus {
        match self {
            Self::FromCache(_) => FetchStatus::FromCache,
            Self::FromSource(_) => FetchStatus::FromSource,
            Self::Error { .. } => FetchStatus::Error,
        }
    }

    /// Payload for successful results.
    pub const fn payload(&self) -> Option<&PlainValue> {
        match self {
            Self::FromCache(value) | Self::FromSource(value) => Some(value),
            Self::Error { .. } => None,
        }
    }

    /// Message for error results.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Whether a payload is available.
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Error { .. })
    }

    /// Transform the payload, keeping the status.
    #[must_use]
    pub fn map_payload(self, f: impl FnOnce(PlainValue) -> PlainValue) -> Self {
        match self {
            Self::FromCache(value) => Self::FromCache(f(value)),
            Self::FromSource(value) => Self::FromSource(f(value)),
            error @ Self::Error { .. } => error,
        }
    }

    /// Pair the result with the name of its payload field.
    pub fn into_response(self, field: &'static str) -> ToolResponse {
        ToolResponse {
            field,
            result: self,
        }
    }
}

/// The mapping handed back to the calling agent:
/// `{"status": ..., "<field>": payload}` or `{"status": "error", "message": ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResponse {
    field: &'static str,
    result: FetchResult,
}

impl ToolResponse {
    /// Name of the payload field.
    pub const fn field(&self) -> &'static str {
        self.field
    }

    /// Underlying result.
    pub const fn result(&self) -> &FetchResult {
        &self.result
    }

    /// Render as a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            serde_json::json!({ "status": "error", "message": err.to_string() })
        })
    }
}

impl Serialize for ToolResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("status", &self.result.status())?;
        match &self.result {
            FetchResult::FromCache(value) | FetchResult::FromSource(value) => {
                map.serialize_entry(self.field, &value.json_safe())?;
            }
            FetchResult::Error { message } => map.serialize_entry("message", message)?,
        }
        map.end()
    }
}
