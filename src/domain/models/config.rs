use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::log_entry::Severity;

/// Main configuration structure for Runscope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Read-through cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Cloud Run / Cloud Logging endpoints and credentials
    #[serde(default)]
    pub source: SourceConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Root of the cache directory tree
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Age after which an entry is refetched
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,

    /// Maximum number of log entries fetched per query
    #[serde(default = "default_log_page_size")]
    pub log_page_size: usize,

    /// Lowest severity included in log queries
    #[serde(default = "default_min_log_severity")]
    pub min_log_severity: Severity,

    /// Revisions returned when the caller does not say
    #[serde(default = "default_max_revisions")]
    pub default_max_revisions: usize,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".cache")
}

const fn default_freshness_secs() -> u64 {
    3600
}

const fn default_log_page_size() -> usize {
    100
}

const fn default_min_log_severity() -> Severity {
    Severity::Warning
}

const fn default_max_revisions() -> usize {
    10
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            freshness_secs: default_freshness_secs(),
            log_page_size: default_log_page_size(),
            min_log_severity: default_min_log_severity(),
            default_max_revisions: default_max_revisions(),
        }
    }
}

/// Data source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SourceConfig {
    /// Cloud Run Admin API base URL
    #[serde(default = "default_run_base_url")]
    pub run_base_url: String,

    /// Cloud Logging API base URL
    #[serde(default = "default_logging_base_url")]
    pub logging_base_url: String,

    /// Static bearer token; when unset, one is obtained from gcloud
    #[serde(default)]
    pub access_token: Option<String>,

    /// Path to the gcloud binary
    #[serde(default = "default_gcloud_path")]
    pub gcloud_path: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_run_base_url() -> String {
    "https://run.googleapis.com".to_string()
}

fn default_logging_base_url() -> String {
    "https://logging.googleapis.com".to_string()
}

fn default_gcloud_path() -> String {
    "gcloud".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            run_base_url: default_run_base_url(),
            logging_base_url: default_logging_base_url(),
            access_token: None,
            gcloud_path: default_gcloud_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output format
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for rolling JSON log files (console only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// File rotation policy
    #[serde(default)]
    pub rotation: RotationPolicy,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
            rotation: RotationPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RotationPolicy {
    #[default]
    Daily,
    Hourly,
    Never,
}
