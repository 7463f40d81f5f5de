//! Common test utilities for integration tests
//!
//! Cloud Run fixtures and a service wired to an in-memory source over a
//! temporary cache directory.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use runscope::adapters::cloud_run::MockCloudRunSource;
use runscope::domain::models::{CacheConfig, Container, RevisionDescriptor, ServiceDescriptor, TrafficStatus};
use runscope::{CloudRunService, TypeConverterRegistry};
use tempfile::TempDir;

pub const PROJECT: &str = "acme";
pub const REGION: &str = "us-central1";

/// Create a temporary directory for test isolation
pub fn temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Setup test logging
pub fn setup_test_logging() {
    use tracing_subscriber::fmt;

    let _ = fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// `base/<project>/cloud-run/<parts...>`
pub fn cache_path(base: &Path, parts: &[&str]) -> PathBuf {
    let mut path = base.join(PROJECT).join("cloud-run");
    for part in parts {
        path.push(part);
    }
    path
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, minute, 0).unwrap()
}

pub fn service(name: &str) -> ServiceDescriptor {
    ServiceDescriptor {
        name: format!("projects/{PROJECT}/locations/{REGION}/services/{name}"),
        uri: format!("https://{name}-abc123.a.run.app"),
        latest_ready_revision: format!("{name}-00002"),
        update_time: Some(at(9, 30)),
        template: runscope::domain::models::RevisionTemplate {
            containers: vec![Container {
                image: format!("gcr.io/{PROJECT}/{name}:v2"),
                ..Container::default()
            }],
            ..Default::default()
        },
        traffic_statuses: vec![TrafficStatus {
            allocation_type: "TRAFFIC_TARGET_ALLOCATION_TYPE_REVISION".to_string(),
            revision: format!("{name}-00002"),
            percent: Some(100),
            tag: "canary".to_string(),
            uri: format!("https://canary---{name}-abc123.a.run.app"),
        }],
        ..ServiceDescriptor::default()
    }
}

pub fn revision(service: &str, number: u32, created: DateTime<Utc>, with_container: bool) -> RevisionDescriptor {
    RevisionDescriptor {
        name: format!("projects/{PROJECT}/locations/{REGION}/services/{service}/revisions/{service}-{number:05}"),
        service: format!("projects/{PROJECT}/locations/{REGION}/services/{service}"),
        create_time: Some(created),
        service_account: "runner@acme.iam.gserviceaccount.com".to_string(),
        containers: if with_container {
            vec![Container {
                image: format!("gcr.io/{PROJECT}/{service}:{number}"),
                ..Container::default()
            }]
        } else {
            Vec::new()
        },
        ..RevisionDescriptor::default()
    }
}

/// Service over `source`, caching under `base_dir`.
pub fn service_over(base_dir: &Path, source: Arc<MockCloudRunSource>) -> CloudRunService {
    let settings = CacheConfig {
        base_dir: base_dir.to_path_buf(),
        ..CacheConfig::default()
    };
    CloudRunService::from_config(source, &settings, Arc::new(TypeConverterRegistry::with_defaults()))
}
