//! File-backed cache for Cloud Run reads.
//!
//! Keys map to a fixed directory layout under a base directory; entries are
//! encoded by file extension and expire after a freshness window.

pub mod converters;
pub mod freshness;
pub mod key_path;
pub mod store;

pub use converters::TypeConverterRegistry;
pub use freshness::{FreshnessPolicy, DEFAULT_FRESHNESS_WINDOW};
pub use key_path::{KeyPathResolver, CLOUD_RUN_NAMESPACE};
pub use store::{CacheStore, Encoding};
