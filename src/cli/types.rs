//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "runscope")]
#[command(about = "Runscope - cached Cloud Run services, revisions, configs and logs", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .runscope/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bypass the cache and always query Cloud Run
    #[arg(short = 'f', long, global = true)]
    pub ignore_cache: bool,
}

/// Project and region every Cloud Run call is scoped to.
#[derive(Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Google Cloud project ID
    #[arg(short, long, env = "GOOGLE_CLOUD_PROJECT")]
    pub project: String,

    /// Cloud Run region
    #[arg(short, long, env = "GOOGLE_CLOUD_REGION", default_value = "us-central1")]
    pub region: String,
}

/// A single revision of a service.
#[derive(Args, Debug, Clone)]
pub struct RevisionArgs {
    #[command(flatten)]
    pub scope: ScopeArgs,

    /// Service name
    pub service: String,

    /// Revision name
    pub revision: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default .runscope/config.yaml
    Init {
        /// Overwrite an existing configuration file
        #[arg(long)]
        force: bool,

        /// Target directory (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List the services of a project and region
    Services {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// List only the service names
    ServiceNames {
        #[command(flatten)]
        scope: ScopeArgs,
    },

    /// List the newest revisions of a service
    Revisions {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Service name
        service: String,

        /// Maximum number of revisions (defaults to cache.default_max_revisions)
        #[arg(short = 'n', long)]
        max_results: Option<usize>,
    },

    /// Show the configuration of a revision as YAML
    Config {
        #[command(flatten)]
        target: RevisionArgs,
    },

    /// Show warning-and-above logs of the last hours
    Logs {
        #[command(flatten)]
        target: RevisionArgs,

        /// Hours to look back
        #[arg(long, default_value = "1")]
        hours_ago: u32,

        /// Day to look at instead of today (YYYYMMDD)
        #[arg(long)]
        day: Option<String>,
    },

    /// Show warning-and-above logs of a window ending at a given date and time
    LogsForDate {
        #[command(flatten)]
        target: RevisionArgs,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        end_date: String,

        /// End time (HH:MM:SS, defaults to 23:59:59)
        #[arg(long)]
        end_time: Option<String>,

        /// IANA timezone of the end date and time (defaults to UTC)
        #[arg(long)]
        timezone: Option<String>,

        /// Window length in hours
        #[arg(long, default_value = "1.0")]
        window_hours: f64,
    },

    /// Print a cached service.yaml snapshot and its URLs
    Snapshot {
        #[command(flatten)]
        scope: ScopeArgs,

        /// Service name
        service: String,
    },
}
