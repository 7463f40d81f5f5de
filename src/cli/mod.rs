//! Command-line interface over the cached Cloud Run accessors.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands, RevisionArgs, ScopeArgs};

/// Print a fatal error in the selected output mode and exit with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let body = serde_json::json!({ "status": "error", "message": format!("{err:#}") });
        eprintln!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
