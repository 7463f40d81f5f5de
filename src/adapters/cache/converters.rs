//! Converter registry for values the default encoders cannot handle.
//!
//! Converters are keyed by the exact `TypeId` of the value: a converter for
//! `RevisionTemplate` is never used for anything else, whatever traits the
//! two types share. Registration happens once at start-up and the registry is
//! then shared read-only with the `CacheStore`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::{
    Condition, Container, ContainerPort, EnvVar, PlainMapBuilder, PlainValue, ResourceRequirements,
    RevisionDescriptor, RevisionTemplate, Scaling, ServiceDescriptor, TrafficStatus,
};

type ConverterFn = Box<dyn Fn(&dyn Any) -> Result<PlainValue, String> + Send + Sync>;

struct Registration {
    type_name: &'static str,
    convert: ConverterFn,
}

/// Registry of `domain object -> PlainValue` converters.
pub struct TypeConverterRegistry {
    converters: HashMap<TypeId, Registration>,
}

impl fmt::Debug for TypeConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeConverterRegistry")
            .field(
                "types",
                &self.converters.values().map(|r| r.type_name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for TypeConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl TypeConverterRegistry {
    /// Registry with no converters.
    pub fn empty() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }

    /// Registry with converters for the Cloud Run descriptors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(|service: &ServiceDescriptor| Ok(service_to_plain(service)));
        registry.register(|template: &RevisionTemplate| Ok(template_to_plain(template)));
        registry.register(|revision: &RevisionDescriptor| Ok(revision_to_plain(revision)));
        registry
    }

    /// Register the converter for `T`, replacing any previous one.
    pub fn register<T, F>(&mut self, converter: F)
    where
        T: Any,
        F: Fn(&T) -> Result<PlainValue, String> + Send + Sync + 'static,
    {
        let convert: ConverterFn = Box::new(move |value: &dyn Any| match value.downcast_ref::<T>() {
            Some(typed) => converter(typed),
            None => Err(format!("registered for {} but received another type", type_name::<T>())),
        });
        self.converters.insert(
            TypeId::of::<T>(),
            Registration {
                type_name: type_name::<T>(),
                convert,
            },
        );
    }

    /// Whether a converter exists for exactly `T`.
    pub fn contains<T: Any>(&self) -> bool {
        self.converters.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Whether no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Convert `value` if a converter is registered for its exact type.
    ///
    /// `None` means "no conversion available"; the caller falls back to its
    /// default encoding. A converter failure is returned, never hidden.
    pub fn convert<T: Any>(&self, value: &T) -> Option<CacheResult<PlainValue>> {
        let registration = self.converters.get(&TypeId::of::<T>())?;
        Some(
            (registration.convert)(value).map_err(|reason| CacheError::Conversion {
                type_name: registration.type_name,
                reason,
            }),
        )
    }
}

fn string_map(map: &std::collections::BTreeMap<String, String>) -> PlainValue {
    PlainValue::Map(
        map.iter()
            .map(|(k, v)| (k.clone(), PlainValue::from(v.as_str())))
            .collect(),
    )
}

fn labels(builder: PlainMapBuilder, map: &std::collections::BTreeMap<String, String>) -> PlainMapBuilder {
    if map.is_empty() {
        builder
    } else {
        builder.field("labels", string_map(map))
    }
}

/// Field/value mapping of a service, keys in API (camelCase) spelling.
pub fn service_to_plain(service: &ServiceDescriptor) -> PlainValue {
    let builder = PlainMapBuilder::new()
        .text("name", &service.name)
        .text("description", &service.description)
        .text("uri", &service.uri)
        .text("creator", &service.creator)
        .text("lastModifier", &service.last_modifier)
        .optional("createTime", service.create_time.map(|t| t.to_rfc3339()))
        .optional("updateTime", service.update_time.map(|t| t.to_rfc3339()));
    labels(builder, &service.labels)
        .text("ingress", &service.ingress)
        .nested("template", template_to_plain(&service.template))
        .list("conditions", service.conditions.iter().map(condition_to_plain).collect())
        .text("latestReadyRevision", &service.latest_ready_revision)
        .text("latestCreatedRevision", &service.latest_created_revision)
        .list(
            "trafficStatuses",
            service.traffic_statuses.iter().map(traffic_to_plain).collect(),
        )
        .build()
}

/// Revision template.
pub fn template_to_plain(template: &RevisionTemplate) -> PlainValue {
    let builder = PlainMapBuilder::new().text("revision", &template.revision);
    labels(builder, &template.labels)
        .nested("scaling", template.scaling.as_ref().map_or(PlainValue::Null, scaling_to_plain))
        .text("timeout", &template.timeout)
        .text("serviceAccount", &template.service_account)
        .list("containers", template.containers.iter().map(container_to_plain).collect())
        .optional("maxInstanceRequestConcurrency", template.max_instance_request_concurrency)
        .build()
}

/// Revision descriptor.
pub fn revision_to_plain(revision: &RevisionDescriptor) -> PlainValue {
    let builder = PlainMapBuilder::new()
        .text("name", &revision.name)
        .text("service", &revision.service)
        .text("generation", &revision.generation)
        .optional("createTime", revision.create_time.map(|t| t.to_rfc3339()));
    labels(builder, &revision.labels)
        .nested("scaling", revision.scaling.as_ref().map_or(PlainValue::Null, scaling_to_plain))
        .text("timeout", &revision.timeout)
        .text("serviceAccount", &revision.service_account)
        .list("containers", revision.containers.iter().map(container_to_plain).collect())
        .optional("maxInstanceRequestConcurrency", revision.max_instance_request_concurrency)
        .text("logUri", &revision.log_uri)
        .list("conditions", revision.conditions.iter().map(condition_to_plain).collect())
        .build()
}

/// Container image, command, env and resources.
pub fn container_to_plain(container: &Container) -> PlainValue {
    PlainMapBuilder::new()
        .text("name", &container.name)
        .text("image", &container.image)
        .list("command", container.command.iter().map(|c| PlainValue::from(c.as_str())).collect())
        .list("args", container.args.iter().map(|a| PlainValue::from(a.as_str())).collect())
        .list("env", container.env.iter().map(env_to_plain).collect())
        .nested(
            "resources",
            container.resources.as_ref().map_or(PlainValue::Null, resources_to_plain),
        )
        .list("ports", container.ports.iter().map(port_to_plain).collect())
        .build()
}

/// Environment variable as a name/value map.
pub fn env_to_plain(env: &EnvVar) -> PlainValue {
    PlainMapBuilder::new()
        .text("name", &env.name)
        .optional("value", env.value.clone())
        .build()
}

/// Resource limits.
pub fn resources_to_plain(resources: &ResourceRequirements) -> PlainValue {
    let builder = if resources.limits.is_empty() {
        PlainMapBuilder::new()
    } else {
        PlainMapBuilder::new().field("limits", string_map(&resources.limits))
    };
    builder
        .optional("cpuIdle", resources.cpu_idle)
        .optional("startupCpuBoost", resources.startup_cpu_boost)
        .build()
}

/// Container port.
pub fn port_to_plain(port: &ContainerPort) -> PlainValue {
    PlainMapBuilder::new()
        .text("name", &port.name)
        .optional("containerPort", port.container_port)
        .build()
}

/// Instance count bounds.
pub fn scaling_to_plain(scaling: &Scaling) -> PlainValue {
    PlainMapBuilder::new()
        .optional("minInstanceCount", scaling.min_instance_count)
        .optional("maxInstanceCount", scaling.max_instance_count)
        .build()
}

/// Status condition.
pub fn condition_to_plain(condition: &Condition) -> PlainValue {
    PlainMapBuilder::new()
        .text("type", &condition.condition_type)
        .text("state", &condition.state)
        .text("message", &condition.message)
        .optional(
            "lastTransitionTime",
            condition.last_transition_time.map(|t| t.to_rfc3339()),
        )
        .text("severity", &condition.severity)
        .text("reason", &condition.reason)
        .build()
}

/// Traffic allocation entry.
pub fn traffic_to_plain(traffic: &TrafficStatus) -> PlainValue {
    PlainMapBuilder::new()
        .text("type", &traffic.allocation_type)
        .text("revision", &traffic.revision)
        .optional("percent", traffic.percent)
        .text("tag", &traffic.tag)
        .text("uri", &traffic.uri)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct Opaque(u8);

    fn revision() -> RevisionDescriptor {
        RevisionDescriptor {
            name: "projects/acme/locations/l/services/api/revisions/api-00001".to_string(),
            service: "projects/acme/locations/l/services/api".to_string(),
            containers: vec![Container {
                image: "gcr.io/acme/api:v1".to_string(),
                resources: Some(ResourceRequirements {
                    limits: BTreeMap::from([("memory".to_string(), "512Mi".to_string())]),
                    ..Default::default()
                }),
                ports: vec![ContainerPort {
                    name: "http1".to_string(),
                    container_port: Some(8080),
                }],
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_cover_descriptors() {
        let registry = TypeConverterRegistry::with_defaults();
        assert!(registry.contains::<ServiceDescriptor>());
        assert!(registry.contains::<RevisionTemplate>());
        assert!(registry.contains::<RevisionDescriptor>());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_unregistered_type_yields_none() {
        let registry = TypeConverterRegistry::with_defaults();
        assert!(registry.convert(&Opaque(1)).is_none());
        assert!(registry.convert(&"plain text".to_string()).is_none());
    }

    #[test]
    fn test_revision_conversion_omits_empty_fields() {
        let registry = TypeConverterRegistry::with_defaults();
        let plain = registry.convert(&revision()).unwrap().unwrap();

        assert_eq!(
            plain.get("name").and_then(PlainValue::as_str),
            Some("projects/acme/locations/l/services/api/revisions/api-00001")
        );
        assert!(plain.get("logUri").is_none());
        assert!(plain.get("scaling").is_none());

        let container = &plain.get("containers").and_then(PlainValue::as_list).unwrap()[0];
        assert_eq!(container.get("image").and_then(PlainValue::as_str), Some("gcr.io/acme/api:v1"));
        let limits = container.get("resources").and_then(|r| r.get("limits")).unwrap();
        assert_eq!(limits.get("memory").and_then(PlainValue::as_str), Some("512Mi"));
        let port = &container.get("ports").and_then(PlainValue::as_list).unwrap()[0];
        assert_eq!(port.get("containerPort"), Some(&PlainValue::Integer(8080)));
    }

    #[test]
    fn test_register_custom_and_replace() {
        let mut registry = TypeConverterRegistry::empty();
        registry.register(|o: &Opaque| Ok(PlainValue::Integer(i64::from(o.0))));
        assert_eq!(registry.convert(&Opaque(7)).unwrap().unwrap(), PlainValue::Integer(7));

        registry.register(|o: &Opaque| Ok(PlainValue::Text(format!("opaque-{}", o.0))));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.convert(&Opaque(7)).unwrap().unwrap(),
            PlainValue::from("opaque-7")
        );
    }

    #[test]
    fn test_converter_failure_is_reported() {
        let mut registry = TypeConverterRegistry::empty();
        registry.register(|_: &Opaque| Err("cannot represent".to_string()));

        let err = registry.convert(&Opaque(0)).unwrap().unwrap_err();
        assert!(matches!(err, CacheError::Conversion { .. }));
        assert!(err.to_string().contains("cannot represent"));
    }

    #[test]
    fn test_exact_type_match_only() {
        let mut registry = TypeConverterRegistry::empty();
        registry.register(|_: &ServiceDescriptor| Ok(PlainValue::Null));
        assert!(registry.convert(&RevisionTemplate::default()).is_none());
        assert!(registry.convert(&Box::new(ServiceDescriptor::default())).is_none());
    }
}
