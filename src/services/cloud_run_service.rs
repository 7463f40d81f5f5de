//! Cached Cloud Run accessors.
//!
//! Each accessor builds its [`CacheKey`], then hands the source call and the
//! reshaping of its answer to the [`ReadThroughOrchestrator`]. The payloads
//! are plain data in the shapes the calling agent tools expect.

use std::any::{type_name, Any};
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, instrument};

use super::log_window::{DateWindow, RelativeWindow, ResolvedWindow};
use super::read_through::ReadThroughOrchestrator;
use crate::adapters::cache::converters::{
    condition_to_plain, env_to_plain, port_to_plain, resources_to_plain, scaling_to_plain,
};
use crate::adapters::cache::TypeConverterRegistry;
use crate::domain::errors::{CacheError, CacheResult, FetchError};
use crate::domain::models::{
    short_name, CacheConfig, CacheKey, DataKind, FetchResult, LogQuery, PlainMapBuilder, PlainValue,
    RevisionDescriptor, RevisionTarget, ServiceDescriptor, ToolResponse,
};
use crate::domain::ports::{Clock, CloudRunSource, SystemClock};

/// Payload field names of the tool responses.
pub const SERVICES_FIELD: &str = "services";
pub const REVISIONS_FIELD: &str = "revisions";
pub const CONFIG_YAML_FIELD: &str = "config_yaml";
pub const LOGS_FIELD: &str = "logs";

/// Version tag carried by every service summary.
pub const SERVICE_SUMMARY_SCHEMA_VERSION: &str = "1.1";

const NOT_AVAILABLE: &str = "N/A";
const NO_CONTAINER: &str = "N/A (no container found)";

/// Google Cloud console page listing the revisions of a service.
pub fn console_url(project_id: &str, region: &str, service: &str) -> String {
    format!("https://console.cloud.google.com/run/detail/{region}/{service}/revisions?project={project_id}")
}

fn timestamp_or_na(time: Option<DateTime<Utc>>) -> String {
    time.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )
}

/// A `service.yaml` snapshot read back from the cache tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedService {
    pub path: PathBuf,
    pub yaml: String,
    /// Service URI followed by the distinct per-tag traffic URIs.
    pub urls: Vec<String>,
}

/// The five cached accessors plus the snapshot reader.
pub struct CloudRunService {
    source: Arc<dyn CloudRunSource>,
    orchestrator: ReadThroughOrchestrator,
    clock: Arc<dyn Clock>,
    settings: CacheConfig,
}

impl CloudRunService {
    pub fn new(source: Arc<dyn CloudRunSource>, orchestrator: ReadThroughOrchestrator, settings: CacheConfig) -> Self {
        Self {
            source,
            orchestrator,
            clock: Arc::new(SystemClock),
            settings,
        }
    }

    pub fn from_config(
        source: Arc<dyn CloudRunSource>,
        settings: &CacheConfig,
        converters: Arc<TypeConverterRegistry>,
    ) -> Self {
        let orchestrator = ReadThroughOrchestrator::from_config(settings, converters);
        Self::new(source, orchestrator, settings.clone())
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn orchestrator(&self) -> &ReadThroughOrchestrator {
        &self.orchestrator
    }

    pub const fn settings(&self) -> &CacheConfig {
        &self.settings
    }

    /// Services of a project in one region, in API order.
    ///
    /// Every raw descriptor is also snapshotted to its `service.yaml`.
    #[instrument(skip(self))]
    pub async fn list_services(&self, project_id: &str, region: &str, ignore_cache: bool) -> FetchResult {
        let key = CacheKey::new(project_id, region, DataKind::List);
        self.orchestrator
            .fetch(&key, ignore_cache, "Failed to list Cloud Run services", move || async move {
                let services = self.source.list_services(project_id, region).await?;
                let mut summaries = Vec::with_capacity(services.len());
                for service in &services {
                    self.snapshot_service(project_id, region, service)?;
                    summaries.push(service_summary(project_id, region, service));
                }
                Ok(PlainValue::List(summaries))
            })
            .await
    }

    /// Short names of the services, taken from [`list_services`](Self::list_services).
    #[instrument(skip(self))]
    pub async fn service_names(&self, project_id: &str, region: &str, ignore_cache: bool) -> FetchResult {
        self.list_services(project_id, region, ignore_cache)
            .await
            .map_payload(|services| {
                let names = services
                    .as_list()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|s| s.get("name").cloned())
                    .collect();
                PlainValue::List(names)
            })
    }

    /// Newest-first summaries of at most `max_results` revisions that run a container.
    #[instrument(skip(self))]
    pub async fn list_revisions(
        &self,
        project_id: &str,
        region: &str,
        service: &str,
        max_results: Option<usize>,
        ignore_cache: bool,
    ) -> FetchResult {
        let max_results = max_results.unwrap_or(self.settings.default_max_revisions);
        let key = CacheKey::new(project_id, region, DataKind::List).with_resource(service);
        let context = format!("Failed to list revisions for {service}");

        self.orchestrator
            .fetch(&key, ignore_cache, &context, move || async move {
                let revisions = self
                    .source
                    .list_revisions(project_id, region, service, max_results)
                    .await?;
                let mut kept: Vec<RevisionDescriptor> = revisions
                    .into_iter()
                    .filter(|r| !r.containers.is_empty())
                    .take(max_results)
                    .collect();
                kept.sort_by(|a, b| b.create_time.cmp(&a.create_time));

                let summaries = kept
                    .iter()
                    .map(|r| self.revision_summary(r))
                    .collect::<Result<Vec<_>, FetchError>>()?;
                Ok(PlainValue::List(summaries))
            })
            .await
    }

    /// Configuration mapping of one revision.
    #[instrument(skip(self), fields(revision = %target.revision))]
    pub async fn get_revision_config(&self, target: &RevisionTarget, ignore_cache: bool) -> FetchResult {
        let key = CacheKey::new(&target.project_id, &target.region, DataKind::Config)
            .with_resource(&target.service)
            .with_sub_resource(&target.revision);
        let context = format!("Failed to get config for revision {}", target.revision);

        self.orchestrator
            .fetch(&key, ignore_cache, &context, move || async move {
                let revision = self
                    .source
                    .get_revision(&target.project_id, &target.region, &target.service, &target.revision)
                    .await?;
                Ok(revision_config(&revision))
            })
            .await
    }

    /// Warning-and-above logs of the last `hours_ago` hours, oldest first.
    #[instrument(skip(self), fields(revision = %target.revision))]
    pub async fn get_logs(&self, target: &RevisionTarget, window: &RelativeWindow, ignore_cache: bool) -> FetchResult {
        match window.resolve(self.clock.now()) {
            Ok(resolved) => self.fetch_logs(target, resolved, ignore_cache).await,
            Err(err) => FetchResult::error(err.to_string()),
        }
    }

    /// Warning-and-above logs of a window ending at a wall-clock instant, oldest first.
    #[instrument(skip(self), fields(revision = %target.revision))]
    pub async fn get_logs_for_date(&self, target: &RevisionTarget, window: &DateWindow, ignore_cache: bool) -> FetchResult {
        match window.resolve() {
            Ok(resolved) => self.fetch_logs(target, resolved, ignore_cache).await,
            Err(err) => FetchResult::error(err.to_string()),
        }
    }

    /// Read a `service.yaml` snapshot without calling the source.
    ///
    /// Freshness is not checked; `Ok(None)` when no snapshot exists.
    pub fn load_cached_service(&self, project_id: &str, region: &str, service: &str) -> CacheResult<Option<CachedService>> {
        let key = CacheKey::new(project_id, region, DataKind::ServiceDescriptor).with_resource(service);
        let path = self.orchestrator.resolver().path_for(&key)?;

        let yaml = match std::fs::read_to_string(&path) {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };
        let value: PlainValue = serde_yaml::from_str(&yaml).map_err(|e| CacheError::Decode {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        Ok(Some(CachedService {
            urls: service_urls(&value),
            path,
            yaml,
        }))
    }

    async fn fetch_logs(&self, target: &RevisionTarget, window: ResolvedWindow, ignore_cache: bool) -> FetchResult {
        let key = CacheKey::new(&target.project_id, &target.region, DataKind::Log)
            .with_resource(&target.service)
            .with_sub_resource(&target.revision)
            .with_hint(&window.cache_prefix);
        let context = format!("Failed to get logs for revision {}", target.revision);
        let query = LogQuery {
            tenant_id: target.project_id.clone(),
            location: target.region.clone(),
            resource_name: target.service.clone(),
            sub_resource_name: target.revision.clone(),
            start: window.start,
            end: window.end,
            min_severity: self.settings.min_log_severity,
            page_size: self.settings.log_page_size,
        };
        debug!(filter = %query.filter(), "log query");

        self.orchestrator
            .fetch(&key, ignore_cache, &context, move || async move {
                let mut entries = self.source.list_log_entries(&query).await?;
                entries.truncate(query.page_size);
                entries.reverse();

                let text = if entries.is_empty() {
                    format!(
                        "--- No logs found for {} between {} and {} ---",
                        query.sub_resource_name,
                        query.start.to_rfc3339(),
                        query.end.to_rfc3339()
                    )
                } else {
                    entries.iter().map(|e| e.render()).collect::<Vec<_>>().join("\n")
                };
                Ok(PlainValue::Text(text))
            })
            .await
    }

    fn snapshot_service(&self, project_id: &str, region: &str, service: &ServiceDescriptor) -> CacheResult<()> {
        let key = CacheKey::new(project_id, region, DataKind::ServiceDescriptor).with_resource(service.short_name());
        self.orchestrator.write_advisory(&key, service)
    }

    fn revision_summary(&self, revision: &RevisionDescriptor) -> Result<PlainValue, FetchError> {
        Ok(PlainMapBuilder::new()
            .field("name", revision.short_name())
            .field("create_time", timestamp_or_na(revision.create_time))
            .field("image", revision.image().unwrap_or(NOT_AVAILABLE))
            .field("descriptor", self.convert_descriptor(revision)?)
            .build())
    }

    fn convert_descriptor<T: Any>(&self, value: &T) -> Result<PlainValue, FetchError> {
        match self.orchestrator.store().converters().convert(value) {
            Some(converted) => Ok(converted?),
            None => Err(CacheError::UnhandledType {
                type_name: type_name::<T>(),
            }
            .into()),
        }
    }
}

fn service_summary(project_id: &str, region: &str, service: &ServiceDescriptor) -> PlainValue {
    let name = service.short_name();
    let image = service
        .template
        .containers
        .first()
        .map_or(NO_CONTAINER, |c| c.image.as_str());

    PlainMapBuilder::new()
        .field("name", name)
        .field("uri", service.uri.as_str())
        .field("last_modifier", timestamp_or_na(service.update_time))
        .field(
            "conditions",
            PlainValue::List(service.conditions.iter().map(condition_to_plain).collect()),
        )
        .field("latest_ready_revision", service.latest_ready_revision.as_str())
        .field("containers__image", image)
        .field("console_url", console_url(project_id, region, name))
        .field("schema_version", SERVICE_SUMMARY_SCHEMA_VERSION)
        .build()
}

fn revision_config(revision: &RevisionDescriptor) -> PlainValue {
    let container = revision.containers.first();
    let container_block = PlainMapBuilder::new()
        .field("image", container.map(|c| c.image.as_str()))
        .field(
            "resources",
            container
                .and_then(|c| c.resources.as_ref())
                .map_or(PlainValue::Null, resources_to_plain),
        )
        .field(
            "env",
            container.map(|c| PlainValue::List(c.env.iter().map(env_to_plain).collect())),
        )
        .field(
            "ports",
            container.map(|c| PlainValue::List(c.ports.iter().map(port_to_plain).collect())),
        )
        .build();

    PlainMapBuilder::new()
        .field("revision_name", revision.short_name())
        .field("service_name", short_name(&revision.service))
        .field(
            "create_time",
            revision
                .create_time
                .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        )
        .field("container", container_block)
        .field(
            "scaling",
            revision.scaling.as_ref().map_or(PlainValue::Null, scaling_to_plain),
        )
        .field("service_account", revision.service_account.as_str())
        .field("log_uri", revision.log_uri.as_str())
        .build()
}

fn service_urls(snapshot: &PlainValue) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    let mut push = |url: Option<&str>| {
        if let Some(url) = url.filter(|u| !u.is_empty()) {
            if !urls.iter().any(|known| known == url) {
                urls.push(url.to_string());
            }
        }
    };

    push(snapshot.get("uri").and_then(PlainValue::as_str));
    for traffic in snapshot
        .get("trafficStatuses")
        .and_then(PlainValue::as_list)
        .unwrap_or_default()
    {
        push(traffic.get("uri").and_then(PlainValue::as_str));
    }
    urls
}

/// `{"status", "services"}` response.
pub fn services_response(result: FetchResult) -> ToolResponse {
    result.into_response(SERVICES_FIELD)
}

/// `{"status", "revisions"}` response.
pub fn revisions_response(result: FetchResult) -> ToolResponse {
    result.into_response(REVISIONS_FIELD)
}

/// `{"status", "config_yaml"}` response; the mapping is rendered as YAML text.
pub fn config_response(result: FetchResult) -> ToolResponse {
    result
        .map_payload(|config| match config {
            PlainValue::Text(text) => PlainValue::Text(text),
            mapping => match mapping.to_yaml_string() {
                Ok(yaml) => PlainValue::Text(yaml),
                Err(_) => PlainValue::Text(mapping.to_string()),
            },
        })
        .into_response(CONFIG_YAML_FIELD)
}

/// `{"status", "logs"}` response.
pub fn logs_response(result: FetchResult) -> ToolResponse {
    result.into_response(LOGS_FIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{Container, TrafficStatus};

    #[test]
    fn test_console_url() {
        assert_eq!(
            console_url("acme", "europe-west1", "api"),
            "https://console.cloud.google.com/run/detail/europe-west1/api/revisions?project=acme"
        );
    }

    #[test]
    fn test_service_summary_without_container() {
        let service = ServiceDescriptor {
            name: "projects/acme/locations/us-central1/services/api".to_string(),
            uri: "https://api.run.app".to_string(),
            ..Default::default()
        };
        let summary = service_summary("acme", "us-central1", &service);

        assert_eq!(summary.get("name").and_then(PlainValue::as_str), Some("api"));
        assert_eq!(summary.get("last_modifier").and_then(PlainValue::as_str), Some("N/A"));
        assert_eq!(
            summary.get("containers__image").and_then(PlainValue::as_str),
            Some("N/A (no container found)")
        );
        assert_eq!(summary.get("schema_version").and_then(PlainValue::as_str), Some("1.1"));
        assert_eq!(summary.get("conditions"), Some(&PlainValue::List(vec![])));
    }

    #[test]
    fn test_revision_config_shape() {
        let revision = RevisionDescriptor {
            name: "projects/acme/locations/l/services/api/revisions/api-00003".to_string(),
            service: "projects/acme/locations/l/services/api".to_string(),
            containers: vec![Container {
                image: "gcr.io/acme/api:v3".to_string(),
                ..Default::default()
            }],
            service_account: "sa@acme".to_string(),
            ..Default::default()
        };
        let config = revision_config(&revision);

        assert_eq!(config.get("revision_name").and_then(PlainValue::as_str), Some("api-00003"));
        assert_eq!(config.get("service_name").and_then(PlainValue::as_str), Some("api"));
        assert_eq!(config.get("create_time"), Some(&PlainValue::Null));
        let container = config.get("container").unwrap();
        assert_eq!(container.get("image").and_then(PlainValue::as_str), Some("gcr.io/acme/api:v3"));
        assert_eq!(container.get("env"), Some(&PlainValue::List(vec![])));
        assert_eq!(config.get("scaling"), Some(&PlainValue::Null));

        let yaml = config.to_yaml_string().unwrap();
        assert!(yaml.starts_with("revision_name: api-00003\nservice_name: api\n"));
    }

    #[test]
    fn test_revision_config_without_container() {
        let config = revision_config(&RevisionDescriptor::default());
        let container = config.get("container").unwrap();
        assert_eq!(container.get("image"), Some(&PlainValue::Null));
        assert_eq!(container.get("ports"), Some(&PlainValue::Null));
    }

    #[test]
    fn test_service_urls_are_distinct() {
        let snapshot = crate::adapters::cache::converters::service_to_plain(&ServiceDescriptor {
            uri: "https://api.run.app".to_string(),
            traffic_statuses: vec![
                TrafficStatus {
                    uri: "https://api.run.app".to_string(),
                    ..Default::default()
                },
                TrafficStatus {
                    tag: "beta".to_string(),
                    uri: "https://beta---api.run.app".to_string(),
                    ..Default::default()
                },
                TrafficStatus::default(),
            ],
            ..Default::default()
        });

        assert_eq!(
            service_urls(&snapshot),
            vec!["https://api.run.app".to_string(), "https://beta---api.run.app".to_string()]
        );
    }

    #[test]
    fn test_config_response_renders_yaml() {
        let result = FetchResult::FromCache(PlainMapBuilder::new().field("revision_name", "r1").build());
        let json = config_response(result).to_json();
        assert_eq!(json["status"], "success_cache");
        assert_eq!(json["config_yaml"], "revision_name: r1\n");
    }
}
