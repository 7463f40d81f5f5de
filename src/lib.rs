//! Runscope - read-through cache for Cloud Run services, revisions, configs and logs
//!
//! Every accessor first looks for a fresh entry in a file-backed cache tree
//! (`<base_dir>/<project>/cloud-run/<service>/...`) and only calls the Cloud Run
//! and Cloud Logging APIs on a miss, writing the answer through for next time.
//! Results come back as tagged `FetchResult`s that render into the
//! `{"status": ..., "<field>": ...}` responses agent tools consume.
//!
//! # Architecture
//!
//! - **Domain Layer** (`domain`): plain values, cache keys, descriptors, errors and ports
//! - **Adapters** (`adapters`): the file cache and the Cloud Run data sources
//! - **Service Layer** (`services`): read-through orchestration and the accessors
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging and wiring
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use runscope::infrastructure::{config::ConfigLoader, setup::build_service};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let service = build_service(&config)?;
//!     let services = service.list_services("acme", "us-central1", false).await;
//!     println!("{}", runscope::services::services_response(services).to_json());
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use adapters::cache::{CacheStore, FreshnessPolicy, KeyPathResolver, TypeConverterRegistry};
pub use adapters::cloud_run::{HttpCloudRunSource, MockCloudRunSource};
pub use domain::errors::{CacheError, FetchError, SourceError};
pub use domain::models::{
    CacheKey, Config, DataKind, FetchResult, FetchStatus, PlainValue, RevisionTarget, ToolResponse,
};
pub use domain::ports::{Clock, CloudRunSource};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{CloudRunService, DateWindow, ReadThroughOrchestrator, RelativeWindow};
