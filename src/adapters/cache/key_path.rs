//! Deterministic mapping from cache keys to file paths.
//!
//! Layout (relative to the cache base directory):
//!
//! ```text
//! <tenant>/cloud-run/endpoints.json                       list at tenant scope
//! <tenant>/cloud-run/<service>/versions.json              list at service scope
//! <tenant>/cloud-run/<service>/service.yaml               service descriptor
//! <tenant>/cloud-run/<service>/<revision>/config.yaml     revision config
//! <tenant>/cloud-run/<service>/<revision>/<hint>_logs.txt log window
//! ```
//!
//! Other tools read `service.yaml` straight from this tree, so the layout is
//! part of the public contract.

use std::path::{Path, PathBuf};

use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::{CacheKey, DataKind};

/// Fixed segment between the tenant and the resource names.
pub const CLOUD_RUN_NAMESPACE: &str = "cloud-run";

/// Hint used for log files when the key carries none.
const DEFAULT_HINT: &str = "data";

/// Maps `CacheKey`s to paths under a base directory.
#[derive(Debug, Clone)]
pub struct KeyPathResolver {
    base_dir: PathBuf,
}

impl KeyPathResolver {
    /// Resolver rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Root of the cache tree.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Path for `key`, creating every intermediate directory.
    pub fn resolve(&self, key: &CacheKey) -> CacheResult<PathBuf> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
        }
        Ok(path)
    }

    /// Path for `key` without touching the filesystem.
    pub fn path_for(&self, key: &CacheKey) -> CacheResult<PathBuf> {
        validate_segment("tenant_id", &key.tenant_id)?;

        let mut path = self.base_dir.join(&key.tenant_id).join(CLOUD_RUN_NAMESPACE);
        match (&key.resource_name, &key.sub_resource_name) {
            (Some(resource), sub) => {
                validate_segment("resource_name", resource)?;
                path.push(resource);
                if let Some(sub) = sub {
                    validate_segment("sub_resource_name", sub)?;
                    path.push(sub);
                }
            }
            (None, Some(sub)) => {
                return Err(CacheError::InvalidKey(format!(
                    "sub_resource_name '{sub}' given without a resource_name"
                )));
            }
            (None, None) => {}
        }

        path.push(file_name(key)?);
        Ok(path)
    }
}

/// File name for the key's data kind and scope.
fn file_name(key: &CacheKey) -> CacheResult<String> {
    let name = match key.data_kind {
        DataKind::List if key.resource_name.is_some() => "versions.json".to_string(),
        DataKind::List => "endpoints.json".to_string(),
        DataKind::Config => "config.yaml".to_string(),
        DataKind::ServiceDescriptor => "service.yaml".to_string(),
        DataKind::Log => {
            let hint = key.filename_hint.as_deref().unwrap_or(DEFAULT_HINT);
            validate_segment("filename_hint", hint)?;
            format!("{hint}_logs.txt")
        }
    };
    Ok(name)
}

/// Identifiers are used verbatim as path segments, so anything that could
/// escape or collapse a directory level is refused.
fn validate_segment(field: &str, value: &str) -> CacheResult<()> {
    if value.is_empty() {
        return Err(CacheError::InvalidKey(format!("{field} is empty")));
    }
    if value == "." || value == ".." {
        return Err(CacheError::InvalidKey(format!("{field} '{value}' is a relative path component")));
    }
    if value.contains(['/', '\\', '\0']) {
        return Err(CacheError::InvalidKey(format!(
            "{field} '{}' contains a path separator or NUL",
            value.escape_default()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver() -> KeyPathResolver {
        KeyPathResolver::new("/cache")
    }

    #[test]
    fn test_file_name_table() {
        let r = resolver();
        let list = CacheKey::new("acme", "us-central1", DataKind::List);
        assert_eq!(r.path_for(&list).unwrap(), Path::new("/cache/acme/cloud-run/endpoints.json"));

        let versions = list.clone().with_resource("api");
        assert_eq!(r.path_for(&versions).unwrap(), Path::new("/cache/acme/cloud-run/api/versions.json"));

        let service = CacheKey::new("acme", "us-central1", DataKind::ServiceDescriptor).with_resource("api");
        assert_eq!(r.path_for(&service).unwrap(), Path::new("/cache/acme/cloud-run/api/service.yaml"));

        let config = CacheKey::new("acme", "us-central1", DataKind::Config)
            .with_resource("api")
            .with_sub_resource("api-00001");
        assert_eq!(
            r.path_for(&config).unwrap(),
            Path::new("/cache/acme/cloud-run/api/api-00001/config.yaml")
        );

        let logs = CacheKey::new("acme", "us-central1", DataKind::Log)
            .with_resource("api")
            .with_sub_resource("api-00001")
            .with_hint("20240501_h1");
        assert_eq!(
            r.path_for(&logs).unwrap(),
            Path::new("/cache/acme/cloud-run/api/api-00001/20240501_h1_logs.txt")
        );
    }

    #[test]
    fn test_log_without_hint_uses_default() {
        let logs = CacheKey::new("acme", "us-central1", DataKind::Log)
            .with_resource("api")
            .with_sub_resource("rev");
        let path = resolver().path_for(&logs).unwrap();
        assert!(path.ends_with("data_logs.txt"));
    }

    #[test]
    fn test_location_does_not_change_path() {
        let r = resolver();
        let a = CacheKey::new("acme", "us-central1", DataKind::List);
        let b = CacheKey::new("acme", "europe-west1", DataKind::List);
        assert_eq!(r.path_for(&a).unwrap(), r.path_for(&b).unwrap());
    }

    #[test]
    fn test_rejects_path_hostile_segments() {
        let r = resolver();
        for bad in ["", ".", "..", "a/b", "a\\b", "nul\0byte"] {
            let key = CacheKey::new("acme", "us-central1", DataKind::List).with_resource(bad);
            assert!(
                matches!(r.path_for(&key), Err(CacheError::InvalidKey(_))),
                "segment {bad:?} should be rejected"
            );
        }

        let tenant = CacheKey::new("../etc", "us-central1", DataKind::List);
        assert!(matches!(r.path_for(&tenant), Err(CacheError::InvalidKey(_))));

        let hint = CacheKey::new("acme", "l", DataKind::Log)
            .with_resource("api")
            .with_sub_resource("rev")
            .with_hint("../../x");
        assert!(matches!(r.path_for(&hint), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_sub_resource_requires_resource() {
        let key = CacheKey::new("acme", "l", DataKind::Config).with_sub_resource("rev");
        assert!(matches!(resolver().path_for(&key), Err(CacheError::InvalidKey(_))));
    }

    #[test]
    fn test_resolve_creates_directories() {
        let temp = TempDir::new().unwrap();
        let r = KeyPathResolver::new(temp.path());
        let key = CacheKey::new("acme", "l", DataKind::Config)
            .with_resource("api")
            .with_sub_resource("rev");

        let path = r.resolve(&key).unwrap();
        assert!(path.parent().unwrap().is_dir());
        assert!(!path.exists());
        assert_eq!(r.resolve(&key).unwrap(), path);
    }

    #[test]
    fn test_resolve_reports_io_failure() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocked");
        std::fs::write(&blocker, "not a directory").unwrap();

        let r = KeyPathResolver::new(&blocker);
        let key = CacheKey::new("acme", "l", DataKind::List);
        assert!(matches!(r.resolve(&key), Err(CacheError::Io { .. })));
    }
}
