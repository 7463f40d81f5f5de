//! Cloud Run data source port.
//!
//! The read-through accessors only depend on this trait; the REST adapter
//! and the in-memory mock both implement it.

use async_trait::async_trait;

use crate::domain::errors::SourceResult;
use crate::domain::models::{LogEntry, LogQuery, RevisionDescriptor, ServiceDescriptor};

/// Read-only view of the Cloud Run control plane and its logs.
#[async_trait]
pub trait CloudRunSource: Send + Sync {
    /// All services of a project in one region, in API order.
    async fn list_services(&self, tenant_id: &str, location: &str) -> SourceResult<Vec<ServiceDescriptor>>;

    /// Revisions of one service.
    ///
    /// `max_results` is a lower bound on how many container-bearing revisions
    /// the caller wants; implementations may return more.
    async fn list_revisions(
        &self,
        tenant_id: &str,
        location: &str,
        resource_name: &str,
        max_results: usize,
    ) -> SourceResult<Vec<RevisionDescriptor>>;

    /// One revision by name.
    async fn get_revision(
        &self,
        tenant_id: &str,
        location: &str,
        resource_name: &str,
        sub_resource_name: &str,
    ) -> SourceResult<RevisionDescriptor>;

    /// Log entries matching the query, newest first, at most `query.page_size`.
    async fn list_log_entries(&self, query: &LogQuery) -> SourceResult<Vec<LogEntry>>;
}
