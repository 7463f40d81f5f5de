//! Cloud Run descriptors as returned by the Admin API (v2 REST surface).
//!
//! These are wire-format objects: they deserialize from the API's camelCase
//! JSON but are deliberately not `Serialize`. The cache layer turns them into
//! `PlainValue` through the converter registry.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Last path segment of a fully qualified resource name
/// (`projects/p/locations/l/services/name` -> `name`).
pub fn short_name(full_name: &str) -> &str {
    full_name.rsplit('/').next().unwrap_or(full_name)
}

/// A Cloud Run service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDescriptor {
    pub name: String,
    pub uri: String,
    pub description: String,
    pub creator: String,
    pub last_modifier: String,
    pub create_time: Option<DateTime<Utc>>,
    pub update_time: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
    pub ingress: String,
    pub template: RevisionTemplate,
    pub conditions: Vec<Condition>,
    pub latest_ready_revision: String,
    pub latest_created_revision: String,
    pub traffic_statuses: Vec<TrafficStatus>,
}

impl ServiceDescriptor {
    /// Service name without the project/location prefix.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }
}

/// The template new revisions of a service are created from.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionTemplate {
    pub revision: String,
    pub labels: BTreeMap<String, String>,
    pub scaling: Option<Scaling>,
    pub timeout: String,
    pub service_account: String,
    pub containers: Vec<Container>,
    pub max_instance_request_concurrency: Option<i64>,
}

/// One immutable revision of a service.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RevisionDescriptor {
    pub name: String,
    pub service: String,
    pub generation: String,
    pub create_time: Option<DateTime<Utc>>,
    pub labels: BTreeMap<String, String>,
    pub scaling: Option<Scaling>,
    pub timeout: String,
    pub service_account: String,
    pub containers: Vec<Container>,
    pub max_instance_request_concurrency: Option<i64>,
    pub log_uri: String,
    pub conditions: Vec<Condition>,
}

impl RevisionDescriptor {
    /// Revision name without the service prefix.
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// First container image, if any container is declared.
    pub fn image(&self) -> Option<&str> {
        self.containers.first().map(|c| c.image.as_str())
    }
}

/// A container within a revision.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    pub args: Vec<String>,
    pub env: Vec<EnvVar>,
    pub resources: Option<ResourceRequirements>,
    pub ports: Vec<ContainerPort>,
}

/// Environment variable. Secret-backed variables carry no literal value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnvVar {
    pub name: String,
    pub value: Option<String>,
}

/// Resource limits of a container.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResourceRequirements {
    pub limits: BTreeMap<String, String>,
    pub cpu_idle: Option<bool>,
    pub startup_cpu_boost: Option<bool>,
}

/// Exposed container port.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerPort {
    pub name: String,
    pub container_port: Option<i64>,
}

/// Autoscaling bounds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Scaling {
    pub min_instance_count: Option<i64>,
    pub max_instance_count: Option<i64>,
}

/// Readiness condition reported by the control plane.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub state: String,
    pub message: String,
    pub last_transition_time: Option<DateTime<Utc>>,
    pub severity: String,
    pub reason: String,
}

/// Where traffic is currently routed.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficStatus {
    #[serde(rename = "type")]
    pub allocation_type: String,
    pub revision: String,
    pub percent: Option<i64>,
    pub tag: String,
    pub uri: String,
}

/// Fully qualified address of one revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RevisionTarget {
    pub project_id: String,
    pub region: String,
    pub service: String,
    pub revision: String,
}

impl RevisionTarget {
    pub fn new(
        project_id: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            region: region.into(),
            service: service.into(),
            revision: revision.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_name() {
        assert_eq!(short_name("projects/p/locations/l/services/api"), "api");
        assert_eq!(short_name("api"), "api");
        assert_eq!(short_name(""), "");
    }

    #[test]
    fn test_deserialize_revision_from_api_json() {
        let json = serde_json::json!({
            "name": "projects/acme/locations/us-central1/services/api/revisions/api-00002-xyz",
            "service": "projects/acme/locations/us-central1/services/api",
            "createTime": "2024-05-01T10:00:00.123456Z",
            "scaling": {"maxInstanceCount": 100},
            "containers": [{
                "image": "gcr.io/acme/api:v2",
                "resources": {"limits": {"memory": "512Mi", "cpu": "1"}, "cpuIdle": true},
                "ports": [{"name": "http1", "containerPort": 8080}],
                "env": [{"name": "MODE", "value": "prod"}]
            }],
            "serviceAccount": "api@acme.iam.gserviceaccount.com",
            "logUri": "https://console.cloud.google.com/logs",
            "unknownField": {"ignored": true}
        });

        let revision: RevisionDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(revision.short_name(), "api-00002-xyz");
        assert_eq!(revision.image(), Some("gcr.io/acme/api:v2"));
        assert_eq!(revision.scaling.as_ref().unwrap().max_instance_count, Some(100));
        let container = &revision.containers[0];
        assert_eq!(container.ports[0].container_port, Some(8080));
        assert_eq!(
            container.resources.as_ref().unwrap().limits.get("memory").map(String::as_str),
            Some("512Mi")
        );
        assert!(revision.create_time.is_some());
    }

    #[test]
    fn test_deserialize_service_with_traffic() {
        let json = serde_json::json!({
            "name": "projects/acme/locations/us-central1/services/web",
            "uri": "https://web-abc-uc.a.run.app",
            "trafficStatuses": [{"type": "TRAFFIC_TARGET_ALLOCATION_TYPE_LATEST", "percent": 100}],
            "conditions": [{"type": "Ready", "state": "CONDITION_SUCCEEDED"}]
        });

        let service: ServiceDescriptor = serde_json::from_value(json).unwrap();
        assert_eq!(service.short_name(), "web");
        assert_eq!(service.traffic_statuses[0].percent, Some(100));
        assert_eq!(service.conditions[0].condition_type, "Ready");
        assert!(service.template.containers.is_empty());
    }
}
