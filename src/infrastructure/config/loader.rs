use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory holding the project-local configuration files.
pub const CONFIG_DIR: &str = ".runscope";

/// Prefix of configuration environment variables; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "RUNSCOPE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid freshness_secs: {0}. Must be positive")]
    InvalidFreshness(u64),

    #[error("Invalid log_page_size: {0}. Must be between 1 and 1000")]
    InvalidLogPageSize(usize),

    #[error("Invalid default_max_revisions: {0}. Must be at least 1")]
    InvalidMaxRevisions(usize),

    #[error("Cache base_dir cannot be empty")]
    EmptyBaseDir,

    #[error("Invalid timeout_secs: {0}. Must be positive")]
    InvalidTimeout(u64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration relative to the working directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .runscope/config.yaml
    /// 3. .runscope/local.yaml (optional developer overrides)
    /// 4. Environment variables (RUNSCOPE_* prefix)
    pub fn load() -> Result<Config> {
        Self::load_in(Path::new("."))
    }

    /// Same as [`load`](Self::load) with the config directory under `root`.
    pub fn load_in(root: &Path) -> Result<Config> {
        let dir = root.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let cache = &config.cache;
        if cache.freshness_secs == 0 {
            return Err(ConfigError::InvalidFreshness(cache.freshness_secs));
        }

        if !(1..=1000).contains(&cache.log_page_size) {
            return Err(ConfigError::InvalidLogPageSize(cache.log_page_size));
        }

        if cache.default_max_revisions == 0 {
            return Err(ConfigError::InvalidMaxRevisions(cache.default_max_revisions));
        }

        if cache.base_dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyBaseDir);
        }

        if config.source.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.source.timeout_secs));
        }

        for (name, url) in [
            ("run_base_url", &config.source.run_base_url),
            ("logging_base_url", &config.source.logging_base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::ValidationFailed(format!(
                    "{name} must be an http(s) URL, got '{url}'"
                )));
            }
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        Ok(())
    }
}
