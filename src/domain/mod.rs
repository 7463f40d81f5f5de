//! Domain layer for Runscope
//!
//! Plain data models, error types and the ports the adapters implement.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{CacheError, CacheResult, FetchError, SourceError, SourceResult};
