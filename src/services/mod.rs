//! Service layer: the read-through sequence and the cached Cloud Run accessors.

pub mod cloud_run_service;
pub mod log_window;
pub mod read_through;

pub use cloud_run_service::{
    config_response, console_url, logs_response, revisions_response, services_response, CachedService,
    CloudRunService,
};
pub use log_window::{DateWindow, RelativeWindow, ResolvedWindow, WindowError};
pub use read_through::ReadThroughOrchestrator;
