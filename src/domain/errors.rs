//! Domain errors for the Runscope cache and data-source boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the cache layer.
///
/// Everything except `InvalidKey` and `Conversion` is advisory: the
/// read-through orchestrator logs it and carries on as if the cache were absent.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode cache entry {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Failed to decode cache entry {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Unhandled data type for caching: {type_name}. Register a converter for it")]
    UnhandledType { type_name: &'static str },

    #[error("Converter for {type_name} failed: {reason}")]
    Conversion { type_name: &'static str, reason: String },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the failure must reach the caller instead of being logged away.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidKey(_) | Self::Conversion { .. })
    }
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Failures reported by the Cloud Run / Cloud Logging data source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Why a fetch-through did not produce a value.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
