//! Domain models: plain data, cache identifiers, results and Cloud Run descriptors.

pub mod cache_key;
pub mod cloud_run;
pub mod config;
pub mod fetch_result;
pub mod log_entry;
pub mod plain_value;

pub use cache_key::{CacheKey, DataKind};
pub use cloud_run::{
    short_name, Condition, Container, ContainerPort, EnvVar, ResourceRequirements,
    RevisionDescriptor, RevisionTarget, RevisionTemplate, Scaling, ServiceDescriptor,
    TrafficStatus,
};
pub use config::{CacheConfig, Config, LogFormat, LoggingConfig, RotationPolicy, SourceConfig};
pub use fetch_result::{FetchResult, FetchStatus, ToolResponse};
pub use log_entry::{LogEntry, LogPayload, LogQuery, Severity};
pub use plain_value::{PlainMapBuilder, PlainValue};
