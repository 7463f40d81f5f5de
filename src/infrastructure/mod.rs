//! Infrastructure layer module
//!
//! - Configuration management
//! - Logging infrastructure
//! - Setup and wiring of the Cloud Run service

pub mod config;
pub mod logging;
pub mod setup;
