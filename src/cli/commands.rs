//! Command handlers: load configuration, wire the service, run one accessor.

use anyhow::{Context, Result};
use tracing::debug;

use super::output::{output, InitOutput, Rendering, SnapshotOutput, ToolOutput};
use super::types::{Cli, Commands, RevisionArgs};
use crate::domain::models::{Config, RevisionTarget};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::LoggerImpl;
use crate::infrastructure::setup::{build_service, create_config_file, SetupPaths};
use crate::services::{
    config_response, logs_response, revisions_response, services_response, CloudRunService,
    DateWindow, RelativeWindow,
};

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

fn revision_target(args: RevisionArgs) -> RevisionTarget {
    RevisionTarget::new(args.scope.project, args.scope.region, args.service, args.revision)
}

/// Run the parsed command. Returns `false` when the command produced an error response.
pub async fn execute(cli: Cli) -> Result<bool> {
    if let Commands::Init { force, path } = &cli.command {
        let paths = SetupPaths::under(path);
        let written = create_config_file(&paths, *force)?;
        output(
            &InitOutput {
                config_file: paths.config_file,
                written,
            },
            cli.json,
        );
        return Ok(true);
    }

    let config = load_config(&cli)?;
    let _logger = LoggerImpl::init(&config.logging).context("Failed to initialize logging")?;
    debug!(base_dir = %config.cache.base_dir.display(), "Configuration loaded");

    let service = build_service(&config)?;
    run(&service, cli.command, cli.ignore_cache, cli.json).await
}

/// Dispatch an accessor command against an already wired service.
pub async fn run(service: &CloudRunService, command: Commands, ignore_cache: bool, json: bool) -> Result<bool> {
    let tool_output = match command {
        Commands::Init { .. } => return Ok(true),
        Commands::Services { scope } => ToolOutput::new(
            services_response(service.list_services(&scope.project, &scope.region, ignore_cache).await),
            Rendering::Services,
        ),
        Commands::ServiceNames { scope } => ToolOutput::new(
            services_response(service.service_names(&scope.project, &scope.region, ignore_cache).await),
            Rendering::Names,
        ),
        Commands::Revisions {
            scope,
            service: name,
            max_results,
        } => ToolOutput::new(
            revisions_response(
                service
                    .list_revisions(&scope.project, &scope.region, &name, max_results, ignore_cache)
                    .await,
            ),
            Rendering::Revisions,
        ),
        Commands::Config { target } => ToolOutput::new(
            config_response(
                service
                    .get_revision_config(&revision_target(target), ignore_cache)
                    .await,
            ),
            Rendering::Text,
        ),
        Commands::Logs {
            target,
            hours_ago,
            day,
        } => {
            let window = RelativeWindow::new(hours_ago, day);
            ToolOutput::new(
                logs_response(
                    service
                        .get_logs(&revision_target(target), &window, ignore_cache)
                        .await,
                ),
                Rendering::Text,
            )
        }
        Commands::LogsForDate {
            target,
            end_date,
            end_time,
            timezone,
            window_hours,
        } => {
            let mut window = DateWindow::new(end_date, window_hours);
            if let Some(end_time) = end_time {
                window = window.at(end_time);
            }
            if let Some(timezone) = timezone {
                window = window.in_zone(timezone);
            }
            ToolOutput::new(
                logs_response(
                    service
                        .get_logs_for_date(&revision_target(target), &window, ignore_cache)
                        .await,
                ),
                Rendering::Text,
            )
        }
        Commands::Snapshot {
            scope,
            service: name,
        } => {
            let snapshot = service
                .load_cached_service(&scope.project, &scope.region, &name)
                .context("Failed to read cached service snapshot")?;
            let found = snapshot.is_some();
            output(
                &SnapshotOutput {
                    service: name,
                    snapshot,
                },
                json,
            );
            return Ok(found);
        }
    };

    output(&tool_output, json);
    Ok(tool_output.is_success())
}
