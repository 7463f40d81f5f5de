//! Output formatting utilities for the CLI.

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};

use crate::domain::models::{FetchResult, FetchStatus, PlainValue, ToolResponse};
use crate::services::CachedService;

pub trait CommandOutput {
    fn to_human(&self) -> String;
    fn to_json(&self) -> serde_json::Value;
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to a maximum number of characters, appending "..." if truncated.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Create a standard list table with the given headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

fn text_field<'a>(item: &'a PlainValue, key: &str) -> &'a str {
    item.get(key).and_then(PlainValue::as_str).unwrap_or("")
}

fn status_line(status: FetchStatus) -> &'static str {
    match status {
        FetchStatus::FromCache => "(served from cache)",
        FetchStatus::FromSource => "(fetched from Cloud Run)",
        FetchStatus::Error => "",
    }
}

/// How a successful payload is rendered for humans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    Services,
    Names,
    Revisions,
    Text,
}

/// A tool response printed by one of the accessor commands.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub response: ToolResponse,
    pub rendering: Rendering,
}

impl ToolOutput {
    pub const fn new(response: ToolResponse, rendering: Rendering) -> Self {
        Self { response, rendering }
    }

    pub fn is_success(&self) -> bool {
        self.response.result().is_success()
    }

    fn render_payload(&self, payload: &PlainValue) -> String {
        let items = payload.as_list().unwrap_or_default();
        match self.rendering {
            Rendering::Services => {
                if items.is_empty() {
                    return "No services found.".to_string();
                }
                let mut table = list_table(&["name", "uri", "latest ready", "image", "last modified"]);
                for item in items {
                    table.add_row(vec![
                        text_field(item, "name").to_string(),
                        text_field(item, "uri").to_string(),
                        text_field(item, "latest_ready_revision").to_string(),
                        truncate(text_field(item, "containers__image"), 60),
                        text_field(item, "last_modifier").to_string(),
                    ]);
                }
                format!("{} service(s):\n{table}", items.len())
            }
            Rendering::Names => items
                .iter()
                .filter_map(PlainValue::as_str)
                .collect::<Vec<_>>()
                .join("\n"),
            Rendering::Revisions => {
                if items.is_empty() {
                    return "No revisions found.".to_string();
                }
                let mut table = list_table(&["name", "created", "image"]);
                for item in items {
                    table.add_row(vec![
                        text_field(item, "name").to_string(),
                        text_field(item, "create_time").to_string(),
                        truncate(text_field(item, "image"), 70),
                    ]);
                }
                format!("{} revision(s):\n{table}", items.len())
            }
            Rendering::Text => payload.to_string(),
        }
    }
}

impl CommandOutput for ToolOutput {
    fn to_human(&self) -> String {
        match self.response.result() {
            FetchResult::Error { message } => format!("Error: {message}"),
            result => {
                let body = result
                    .payload()
                    .map(|payload| self.render_payload(payload))
                    .unwrap_or_default();
                format!("{body}\n{}", status_line(result.status()))
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        self.response.to_json()
    }
}

/// Output of `runscope snapshot`.
#[derive(Debug, Clone)]
pub struct SnapshotOutput {
    pub service: String,
    pub snapshot: Option<CachedService>,
}

impl CommandOutput for SnapshotOutput {
    fn to_human(&self) -> String {
        match &self.snapshot {
            None => format!(
                "No cached snapshot for service '{}'. Run `runscope services` first.",
                self.service
            ),
            Some(snapshot) => {
                let mut lines = vec![format!("Snapshot: {}", snapshot.path.display())];
                if !snapshot.urls.is_empty() {
                    lines.push("\nURLs:".to_string());
                    lines.extend(snapshot.urls.iter().map(|url| format!("  - {url}")));
                }
                lines.push(String::new());
                lines.push(snapshot.yaml.trim_end().to_string());
                lines.join("\n")
            }
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match &self.snapshot {
            None => serde_json::json!({ "service": self.service, "found": false }),
            Some(snapshot) => serde_json::json!({
                "service": self.service,
                "found": true,
                "path": snapshot.path,
                "urls": snapshot.urls,
                "yaml": snapshot.yaml,
            }),
        }
    }
}

/// Output of `runscope init`.
#[derive(Debug, Clone)]
pub struct InitOutput {
    pub config_file: std::path::PathBuf,
    pub written: bool,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        if self.written {
            format!("Wrote default configuration to {}", self.config_file.display())
        } else {
            format!(
                "{} already exists. Use --force to overwrite.",
                self.config_file.display()
            )
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({ "config_file": self.config_file, "written": self.written })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PlainMapBuilder;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("gcr.io/acme/very-long-image", 10), "gcr.io/...");
        assert_eq!(truncate("ééééé", 4), "é...");
    }

    #[test]
    fn test_services_table() {
        let services = PlainValue::List(vec![PlainMapBuilder::new()
            .field("name", "api")
            .field("uri", "https://api.run.app")
            .build()]);
        let output = ToolOutput::new(
            FetchResult::FromCache(services).into_response("services"),
            Rendering::Services,
        );

        let human = output.to_human();
        assert!(human.starts_with("1 service(s):"));
        assert!(human.contains("https://api.run.app"));
        assert!(human.ends_with("(served from cache)"));
        assert_eq!(output.to_json()["status"], "success_cache");
    }

    #[test]
    fn test_error_rendering() {
        let output = ToolOutput::new(FetchResult::error("boom").into_response("logs"), Rendering::Text);
        assert!(!output.is_success());
        assert_eq!(output.to_human(), "Error: boom");
        assert_eq!(output.to_json()["message"], "boom");
    }

    #[test]
    fn test_names_rendering() {
        let output = ToolOutput::new(
            FetchResult::FromSource(PlainValue::from(vec!["api", "web"])).into_response("services"),
            Rendering::Names,
        );
        assert_eq!(output.to_human(), "api\nweb\n(fetched from Cloud Run)");
    }
}
