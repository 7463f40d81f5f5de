//! REST implementation of [`CloudRunSource`].
//!
//! Talks to the Cloud Run Admin API v2 for services and revisions, and to
//! the Cloud Logging API v2 (`entries:list`) for revision logs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};

use super::token::AccessTokenProvider;
use crate::domain::errors::{SourceError, SourceResult};
use crate::domain::models::{
    LogEntry, LogPayload, LogQuery, PlainValue, RevisionDescriptor, ServiceDescriptor, Severity,
    SourceConfig,
};
use crate::domain::ports::CloudRunSource;

/// Largest page the Admin API hands out for list calls.
const MAX_LIST_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListServicesResponse {
    services: Vec<ServiceDescriptor>,
    next_page_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListRevisionsResponse {
    revisions: Vec<RevisionDescriptor>,
    next_page_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListLogEntriesRequest {
    resource_names: Vec<String>,
    filter: String,
    order_by: &'static str,
    page_size: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ListLogEntriesResponse {
    entries: Vec<WireLogEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WireLogEntry {
    timestamp: Option<DateTime<Utc>>,
    severity: Option<String>,
    text_payload: Option<String>,
    json_payload: Option<serde_json::Value>,
    proto_payload: Option<serde_json::Value>,
}

impl WireLogEntry {
    fn into_entry(self) -> Option<LogEntry> {
        let timestamp = self.timestamp?;
        let severity = self
            .severity
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Severity::Default);
        let payload = match (self.text_payload, self.json_payload, self.proto_payload) {
            (Some(text), _, _) => LogPayload::Text(text),
            (None, Some(json), _) | (None, None, Some(json)) => {
                LogPayload::Structured(PlainValue::from(json))
            }
            (None, None, None) => LogPayload::Empty,
        };
        Some(LogEntry {
            timestamp,
            severity,
            payload,
        })
    }
}

/// Cloud Run and Cloud Logging over HTTPS.
#[derive(Debug)]
pub struct HttpCloudRunSource {
    http: Client,
    run_base_url: String,
    logging_base_url: String,
    tokens: AccessTokenProvider,
}

impl HttpCloudRunSource {
    pub fn new(settings: &SourceConfig) -> SourceResult<Self> {
        let tokens =
            AccessTokenProvider::from_settings(settings.access_token.as_deref(), &settings.gcloud_path);
        Self::with_token_provider(settings, tokens)
    }

    pub fn with_token_provider(settings: &SourceConfig, tokens: AccessTokenProvider) -> SourceResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .user_agent(concat!("runscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SourceError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            run_base_url: settings.run_base_url.trim_end_matches('/').to_string(),
            logging_base_url: settings.logging_base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    async fn get(&self, url: &str, query: &[(&str, String)], what: &str) -> SourceResult<Response> {
        let token = self.tokens.token().await?;
        let resp = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("GET {what}: {e}")))?;
        check_status(resp, what).await
    }

    fn services_url(&self, tenant_id: &str, location: &str) -> String {
        format!(
            "{}/v2/projects/{tenant_id}/locations/{location}/services",
            self.run_base_url
        )
    }
}

async fn check_status(resp: Response, what: &str) -> SourceResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    tracing::debug!(status = status.as_u16(), what, "API call rejected");
    Err(match status {
        StatusCode::NOT_FOUND => SourceError::NotFound(what.to_string()),
        StatusCode::UNAUTHORIZED => SourceError::Authentication(body),
        StatusCode::FORBIDDEN => SourceError::PermissionDenied(body),
        _ => SourceError::Api {
            status: status.as_u16(),
            body,
        },
    })
}

async fn decode<T: for<'de> Deserialize<'de>>(resp: Response, what: &str) -> SourceResult<T> {
    resp.json::<T>()
        .await
        .map_err(|e| SourceError::Decode(format!("{what}: {e}")))
}

#[async_trait]
impl CloudRunSource for HttpCloudRunSource {
    async fn list_services(&self, tenant_id: &str, location: &str) -> SourceResult<Vec<ServiceDescriptor>> {
        let url = self.services_url(tenant_id, location);
        let what = format!("services of projects/{tenant_id}/locations/{location}");
        let mut services = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut query = vec![("pageSize", MAX_LIST_PAGE_SIZE.to_string())];
            if !page_token.is_empty() {
                query.push(("pageToken", page_token.clone()));
            }
            let page: ListServicesResponse = decode(self.get(&url, &query, &what).await?, &what).await?;
            services.extend(page.services);
            if page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        tracing::debug!(count = services.len(), tenant_id, location, "listed services");
        Ok(services)
    }

    async fn list_revisions(
        &self,
        tenant_id: &str,
        location: &str,
        resource_name: &str,
        max_results: usize,
    ) -> SourceResult<Vec<RevisionDescriptor>> {
        let url = format!("{}/{resource_name}/revisions", self.services_url(tenant_id, location));
        let what = format!("revisions of service {resource_name}");
        let page_size = max_results.clamp(1, MAX_LIST_PAGE_SIZE);
        let mut revisions: Vec<RevisionDescriptor> = Vec::new();
        let mut page_token = String::new();

        loop {
            let mut query = vec![("pageSize", page_size.to_string())];
            if !page_token.is_empty() {
                query.push(("pageToken", page_token.clone()));
            }
            let page: ListRevisionsResponse = decode(self.get(&url, &query, &what).await?, &what).await?;
            revisions.extend(page.revisions);

            let with_containers = revisions.iter().filter(|r| !r.containers.is_empty()).count();
            if with_containers >= max_results || page.next_page_token.is_empty() {
                break;
            }
            page_token = page.next_page_token;
        }

        Ok(revisions)
    }

    async fn get_revision(
        &self,
        tenant_id: &str,
        location: &str,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> SourceResult<RevisionDescriptor> {
        let url = format!(
            "{}/{resource_name}/revisions/{sub_resource_name}",
            self.services_url(tenant_id, location)
        );
        let what = format!("revision {sub_resource_name}");
        decode(self.get(&url, &[], &what).await?, &what).await
    }

    async fn list_log_entries(&self, query: &LogQuery) -> SourceResult<Vec<LogEntry>> {
        let url = format!("{}/v2/entries:list", self.logging_base_url);
        let what = format!("log entries of revision {}", query.sub_resource_name);
        let body = ListLogEntriesRequest {
            resource_names: vec![format!("projects/{}", query.tenant_id)],
            filter: query.filter(),
            order_by: "timestamp desc",
            page_size: query.page_size,
        };

        let token = self.tokens.token().await?;
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SourceError::Transport(format!("POST {what}: {e}")))?;
        let page: ListLogEntriesResponse = decode(check_status(resp, &what).await?, &what).await?;

        let mut entries: Vec<LogEntry> = page
            .entries
            .into_iter()
            .filter_map(WireLogEntry::into_entry)
            .collect();
        entries.truncate(query.page_size);
        Ok(entries)
    }
}
