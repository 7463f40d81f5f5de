//! Infrastructure adapters for external systems.

pub mod cache;
pub mod cloud_run;
