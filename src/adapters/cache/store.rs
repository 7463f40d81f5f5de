//! Format-aware reads and writes of single cache files.
//!
//! The encoding is implied by the file extension: `.json` for structured
//! lists, `.yaml` for configuration and descriptors, raw text for everything
//! else. Writes go to a temporary file in the same directory and are renamed
//! into place, so readers never see a half-written entry.

use std::any::{type_name, Any};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use super::converters::TypeConverterRegistry;
use crate::domain::errors::{CacheError, CacheResult};
use crate::domain::models::PlainValue;

/// On-disk encoding of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Json,
    Yaml,
    Text,
}

impl Encoding {
    /// Encoding implied by the extension of `path`; text when unrecognised.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Text,
        }
    }
}

/// Reads and writes cache entries.
#[derive(Debug, Clone)]
pub struct CacheStore {
    converters: Arc<TypeConverterRegistry>,
}

impl CacheStore {
    /// Store that encodes non-native types through `converters`.
    pub fn new(converters: Arc<TypeConverterRegistry>) -> Self {
        Self { converters }
    }

    /// Converters consulted on write.
    pub fn converters(&self) -> &TypeConverterRegistry {
        &self.converters
    }

    /// Replace the entry at `path` with `value`.
    ///
    /// A registered converter for `T` wins; otherwise `value` must be one of
    /// the natively encodable types (`PlainValue`, `String`, `&str`,
    /// `serde_json::Value`, `Vec<PlainValue>`).
    pub fn write<T: Any>(&self, path: &Path, value: &T) -> CacheResult<()> {
        let plain = match self.converters.convert(value) {
            Some(converted) => {
                debug!(type_name = type_name::<T>(), "custom conversion applied");
                converted?
            }
            None => natively_encodable(value).ok_or(CacheError::UnhandledType {
                type_name: type_name::<T>(),
            })?,
        };

        let bytes = encode(path, &plain)?;
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut file = NamedTempFile::new_in(parent).map_err(|e| CacheError::io(parent, e))?;
        file.write_all(&bytes).map_err(|e| CacheError::io(path, e))?;
        file.flush().map_err(|e| CacheError::io(path, e))?;
        file.persist(path).map_err(|e| CacheError::io(path, e.error))?;

        debug!(path = %path.display(), bytes = bytes.len(), "cache entry written");
        Ok(())
    }

    /// Decode the entry at `path`; `Ok(None)` when there is none.
    pub fn read(&self, path: &Path) -> CacheResult<Option<PlainValue>> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(path, e)),
        };

        let value = match Encoding::for_path(path) {
            Encoding::Json => serde_json::from_str(&contents).map_err(|e| CacheError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            Encoding::Yaml => serde_yaml::from_str(&contents).map_err(|e| CacheError::Decode {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?,
            Encoding::Text => PlainValue::Text(contents),
        };

        debug!(path = %path.display(), "cache entry read");
        Ok(Some(value))
    }
}

fn natively_encodable(value: &dyn Any) -> Option<PlainValue> {
    if let Some(plain) = value.downcast_ref::<PlainValue>() {
        return Some(plain.clone());
    }
    if let Some(text) = value.downcast_ref::<String>() {
        return Some(PlainValue::Text(text.clone()));
    }
    if let Some(text) = value.downcast_ref::<&str>() {
        return Some(PlainValue::from(*text));
    }
    if let Some(json) = value.downcast_ref::<serde_json::Value>() {
        return Some(PlainValue::from(json.clone()));
    }
    value
        .downcast_ref::<Vec<PlainValue>>()
        .map(|items| PlainValue::List(items.clone()))
}

fn encode(path: &Path, value: &PlainValue) -> CacheResult<Vec<u8>> {
    let encode_error = |reason: String| CacheError::Encode {
        path: path.to_path_buf(),
        reason,
    };

    match Encoding::for_path(path) {
        Encoding::Json => {
            let mut bytes =
                serde_json::to_vec_pretty(&value.json_safe()).map_err(|e| encode_error(e.to_string()))?;
            bytes.push(b'\n');
            Ok(bytes)
        }
        Encoding::Yaml => value
            .to_yaml_string()
            .map(String::into_bytes)
            .map_err(|e| encode_error(e.to_string())),
        Encoding::Text => Ok(value.to_string().into_bytes()),
    }
}
