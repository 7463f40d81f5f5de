//! Composite identifiers for cache entries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of data an entry holds.
///
/// The kind picks both the file name and, through its extension, the encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    /// Enumeration of resources (or of sub-resources when scoped to a resource).
    List,
    /// Configuration of a single sub-resource.
    Config,
    /// Free-text log body.
    Log,
    /// Full descriptor of a single resource.
    ServiceDescriptor,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Config => "config",
            Self::Log => "log",
            Self::ServiceDescriptor => "service_descriptor",
        };
        f.write_str(name)
    }
}

/// Identifier of one cache entry.
///
/// Equal keys always resolve to the same storage path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Project the data belongs to.
    pub tenant_id: String,
    /// Region the data was fetched from.
    pub location: String,
    /// Service name, when the entry is scoped to one service.
    pub resource_name: Option<String>,
    /// Revision name, when the entry is scoped to one revision.
    pub sub_resource_name: Option<String>,
    /// Kind of payload.
    pub data_kind: DataKind,
    /// Distinguishes several entries of the same kind (log windows).
    pub filename_hint: Option<String>,
}

impl CacheKey {
    /// Key at tenant scope.
    pub fn new(tenant_id: impl Into<String>, location: impl Into<String>, data_kind: DataKind) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            location: location.into(),
            resource_name: None,
            sub_resource_name: None,
            data_kind,
            filename_hint: None,
        }
    }

    /// Narrow the key to one resource.
    #[must_use]
    pub fn with_resource(mut self, resource_name: impl Into<String>) -> Self {
        self.resource_name = Some(resource_name.into());
        self
    }

    /// Narrow the key to one sub-resource.
    #[must_use]
    pub fn with_sub_resource(mut self, sub_resource_name: impl Into<String>) -> Self {
        self.sub_resource_name = Some(sub_resource_name.into());
        self
    }

    /// Attach a filename hint.
    #[must_use]
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.filename_hint = Some(hint.into());
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, self.location)?;
        if let Some(resource) = &self.resource_name {
            write!(f, "/{resource}")?;
        }
        if let Some(sub) = &self.sub_resource_name {
            write!(f, "/{sub}")?;
        }
        write!(f, " [{}", self.data_kind)?;
        if let Some(hint) = &self.filename_hint {
            write!(f, ":{hint}")?;
        }
        f.write_str("]")
    }
}
