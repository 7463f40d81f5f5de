//! In-memory [`CloudRunSource`] for tests and offline runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{SourceError, SourceResult};
use crate::domain::models::{LogEntry, LogQuery, RevisionDescriptor, ServiceDescriptor};
use crate::domain::ports::CloudRunSource;

/// Operation names accepted by [`MockCloudRunSource::fail_on`].
pub const LIST_SERVICES: &str = "list_services";
pub const LIST_REVISIONS: &str = "list_revisions";
pub const GET_REVISION: &str = "get_revision";
pub const LIST_LOG_ENTRIES: &str = "list_log_entries";

#[derive(Debug, Default)]
struct MockState {
    services: Vec<ServiceDescriptor>,
    revisions: HashMap<String, Vec<RevisionDescriptor>>,
    logs: HashMap<String, Vec<LogEntry>>,
    failures: HashMap<&'static str, SourceError>,
}

#[derive(Debug, Default)]
struct CallCounters {
    list_services: AtomicUsize,
    list_revisions: AtomicUsize,
    get_revision: AtomicUsize,
    list_log_entries: AtomicUsize,
}

/// Canned Cloud Run data with per-operation call counters.
///
/// Revisions and logs are keyed by short service / revision name; the
/// project and region are ignored.
#[derive(Debug, Default)]
pub struct MockCloudRunSource {
    state: RwLock<MockState>,
    calls: CallCounters,
}

impl MockCloudRunSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_services(services: Vec<ServiceDescriptor>) -> Self {
        Self {
            state: RwLock::new(MockState {
                services,
                ..Default::default()
            }),
            calls: CallCounters::default(),
        }
    }

    pub async fn set_services(&self, services: Vec<ServiceDescriptor>) {
        self.state.write().await.services = services;
    }

    pub async fn set_revisions(&self, service: &str, revisions: Vec<RevisionDescriptor>) {
        self.state.write().await.revisions.insert(service.to_string(), revisions);
    }

    pub async fn set_logs(&self, revision: &str, entries: Vec<LogEntry>) {
        self.state.write().await.logs.insert(revision.to_string(), entries);
    }

    /// Make every later call to `operation` fail with `error`.
    pub async fn fail_on(&self, operation: &'static str, error: SourceError) {
        self.state.write().await.failures.insert(operation, error);
    }

    pub async fn clear_failures(&self) {
        self.state.write().await.failures.clear();
    }

    pub fn list_services_calls(&self) -> usize {
        self.calls.list_services.load(Ordering::SeqCst)
    }

    pub fn list_revisions_calls(&self) -> usize {
        self.calls.list_revisions.load(Ordering::SeqCst)
    }

    pub fn get_revision_calls(&self) -> usize {
        self.calls.get_revision.load(Ordering::SeqCst)
    }

    pub fn list_log_entries_calls(&self) -> usize {
        self.calls.list_log_entries.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_services_calls()
            + self.list_revisions_calls()
            + self.get_revision_calls()
            + self.list_log_entries_calls()
    }

    async fn check_failure(&self, operation: &'static str) -> SourceResult<()> {
        match self.state.read().await.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CloudRunSource for MockCloudRunSource {
    async fn list_services(&self, _tenant_id: &str, _location: &str) -> SourceResult<Vec<ServiceDescriptor>> {
        self.calls.list_services.fetch_add(1, Ordering::SeqCst);
        self.check_failure(LIST_SERVICES).await?;
        Ok(self.state.read().await.services.clone())
    }

    async fn list_revisions(
        &self,
        _tenant_id: &str,
        _location: &str,
        resource_name: &str,
        _max_results: usize,
    ) -> SourceResult<Vec<RevisionDescriptor>> {
        self.calls.list_revisions.fetch_add(1, Ordering::SeqCst);
        self.check_failure(LIST_REVISIONS).await?;
        self.state
            .read()
            .await
            .revisions
            .get(resource_name)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(format!("service {resource_name}")))
    }

    async fn get_revision(
        &self,
        _tenant_id: &str,
        _location: &str,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> SourceResult<RevisionDescriptor> {
        self.calls.get_revision.fetch_add(1, Ordering::SeqCst);
        self.check_failure(GET_REVISION).await?;
        self.state
            .read()
            .await
            .revisions
            .get(resource_name)
            .and_then(|revisions| {
                revisions
                    .iter()
                    .find(|r| r.short_name() == sub_resource_name)
                    .cloned()
            })
            .ok_or_else(|| SourceError::NotFound(format!("revision {sub_resource_name}")))
    }

    async fn list_log_entries(&self, query: &LogQuery) -> SourceResult<Vec<LogEntry>> {
        self.calls.list_log_entries.fetch_add(1, Ordering::SeqCst);
        self.check_failure(LIST_LOG_ENTRIES).await?;

        let state = self.state.read().await;
        let mut entries: Vec<LogEntry> = state
            .logs
            .get(&query.sub_resource_name)
            .map(|all| all.iter().filter(|e| query.matches(e)).cloned().collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(query.page_size);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Severity;
    use chrono::{Duration, TimeZone, Utc};

    #[tokio::test]
    async fn test_counts_calls_and_fails_on_demand() {
        let source = MockCloudRunSource::with_services(vec![ServiceDescriptor::default()]);
        assert_eq!(source.list_services("p", "r").await.unwrap().len(), 1);
        assert_eq!(source.list_services_calls(), 1);

        source
            .fail_on(LIST_SERVICES, SourceError::PermissionDenied("nope".to_string()))
            .await;
        assert!(source.list_services("p", "r").await.is_err());
        assert_eq!(source.list_services_calls(), 2);

        source.clear_failures().await;
        assert!(source.list_services("p", "r").await.is_ok());
    }

    #[tokio::test]
    async fn test_logs_are_newest_first_and_bounded() {
        let source = MockCloudRunSource::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let entries = (1..=5)
            .map(|i| LogEntry::text(base - Duration::minutes(i), Severity::Error, format!("m{i}")))
            .collect();
        source.set_logs("api-00001", entries).await;

        let query = LogQuery {
            tenant_id: "p".to_string(),
            location: "r".to_string(),
            resource_name: "api".to_string(),
            sub_resource_name: "api-00001".to_string(),
            start: base - Duration::hours(1),
            end: base,
            min_severity: Severity::Warning,
            page_size: 3,
        };
        let got = source.list_log_entries(&query).await.unwrap();
        assert_eq!(got.len(), 3);
        assert!(got[0].timestamp > got[1].timestamp);
        assert_eq!(got[0].payload, crate::domain::models::LogPayload::Text("m1".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let source = MockCloudRunSource::new();
        let err = source.list_revisions("p", "r", "ghost", 10).await.unwrap_err();
        assert_eq!(err, SourceError::NotFound("service ghost".to_string()));
    }
}
