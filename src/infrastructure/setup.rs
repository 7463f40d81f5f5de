//! Runscope setup and wiring
//!
//! - Project configuration directory and default config file
//! - Construction of the Cloud Run service from a loaded `Config`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use super::config::CONFIG_DIR;
use crate::adapters::cache::TypeConverterRegistry;
use crate::adapters::cloud_run::HttpCloudRunSource;
use crate::domain::models::Config;
use crate::domain::ports::CloudRunSource;
use crate::services::CloudRunService;

/// Default configuration template content
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# Runscope Configuration
# Override settings by editing this file, adding .runscope/local.yaml,
# or setting environment variables with the RUNSCOPE_ prefix.
#
# Example environment variables:
#   export RUNSCOPE_CACHE__FRESHNESS_SECS=600
#   export RUNSCOPE_SOURCE__ACCESS_TOKEN=$(gcloud auth print-access-token)
#   export RUNSCOPE_LOGGING__LEVEL=debug

cache:
  # Root of the cache tree (<base_dir>/<project>/cloud-run/...)
  base_dir: ".cache"

  # Seconds before a cached entry is fetched again
  freshness_secs: 3600

  # Maximum log entries per query (1-1000)
  log_page_size: 100

  # Lowest severity included in log queries
  min_log_severity: WARNING

  # Revisions listed when no limit is given
  default_max_revisions: 10

source:
  run_base_url: "https://run.googleapis.com"
  logging_base_url: "https://logging.googleapis.com"

  # Leave unset to use `gcloud auth print-access-token`
  # access_token: "..."
  gcloud_path: "gcloud"
  timeout_secs: 60

logging:
  # Log level: trace, debug, info, warn, error
  level: "info"

  # Console format: json, pretty
  format: "pretty"

  # Rolling JSON log files (daily, hourly, never)
  # log_dir: ".runscope/logs"
  rotation: "daily"
"#;

/// Paths of the project-local configuration.
#[derive(Debug, Clone)]
pub struct SetupPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
}

impl SetupPaths {
    /// Setup paths under `root`.
    pub fn under(root: &Path) -> Self {
        let config_dir = root.join(CONFIG_DIR);
        Self {
            config_file: config_dir.join("config.yaml"),
            config_dir,
        }
    }

    /// Setup paths for the current directory
    pub fn new() -> Result<Self> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        Ok(Self::under(&current_dir))
    }

    pub fn is_initialized(&self) -> bool {
        self.config_file.exists()
    }
}

/// Write the default configuration file; existing files are kept unless `force`.
///
/// Returns whether a file was written.
pub fn create_config_file(paths: &SetupPaths, force: bool) -> Result<bool> {
    if paths.config_file.exists() && !force {
        return Ok(false);
    }

    fs::create_dir_all(&paths.config_dir).context("Failed to create config directory")?;
    fs::write(&paths.config_file, DEFAULT_CONFIG_TEMPLATE).context("Failed to write config file")?;
    Ok(true)
}

/// The REST data source described by `config.source`.
pub fn build_source(config: &Config) -> Result<Arc<dyn CloudRunSource>> {
    let source = HttpCloudRunSource::new(&config.source).context("Failed to create Cloud Run client")?;
    Ok(Arc::new(source))
}

/// Service over `source` with the default descriptor converters.
pub fn build_service_with_source(config: &Config, source: Arc<dyn CloudRunSource>) -> CloudRunService {
    let converters = Arc::new(TypeConverterRegistry::with_defaults());
    CloudRunService::from_config(source, &config.cache, converters)
}

/// Service over the REST data source.
pub fn build_service(config: &Config) -> Result<CloudRunService> {
    Ok(build_service_with_source(config, build_source(config)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cloud_run::MockCloudRunSource;
    use crate::infrastructure::config::ConfigLoader;
    use tempfile::TempDir;

    #[test]
    fn test_default_template_is_valid_config() {
        let config: Config = serde_yaml::from_str(DEFAULT_CONFIG_TEMPLATE).unwrap();
        ConfigLoader::validate(&config).unwrap();
        assert_eq!(config.cache.freshness_secs, 3600);
    }

    #[test]
    fn test_create_config_file_respects_force() {
        let temp = TempDir::new().unwrap();
        let paths = SetupPaths::under(temp.path());
        assert!(!paths.is_initialized());

        assert!(create_config_file(&paths, false).unwrap());
        assert!(paths.is_initialized());

        fs::write(&paths.config_file, "cache: {}\n").unwrap();
        assert!(!create_config_file(&paths, false).unwrap());
        assert_eq!(fs::read_to_string(&paths.config_file).unwrap(), "cache: {}\n");

        assert!(create_config_file(&paths, true).unwrap());
        assert!(fs::read_to_string(&paths.config_file).unwrap().starts_with("# Runscope"));
    }

    #[test]
    fn test_build_service_uses_cache_settings() {
        let mut config = Config::default();
        config.cache.base_dir = PathBuf::from("/tmp/runscope-test");
        config.cache.default_max_revisions = 3;

        let service = build_service_with_source(&config, Arc::new(MockCloudRunSource::new()));
        assert_eq!(service.settings().default_max_revisions, 3);
        assert_eq!(
            service.orchestrator().resolver().base_dir(),
            Path::new("/tmp/runscope-test")
        );
    }

    #[test]
    fn test_build_service_with_static_token() {
        let mut config = Config::default();
        config.source.access_token = Some("token".to_string());
        assert!(build_service(&config).is_ok());
    }
}
