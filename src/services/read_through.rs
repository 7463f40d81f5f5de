//! The fetch-or-use-cache sequence shared by every Cloud Run accessor.
//!
//! ```text
//! resolve key -> fresh entry? -> yes: FromCache
//!                             -> no:  fetch -> ok:  write, FromSource
//!                                           -> err: Error
//! ```
//!
//! Nothing escapes as `Err`: source failures and fatal cache failures become
//! [`FetchResult::Error`], advisory cache failures are logged and ignored.

use std::any::Any;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::adapters::cache::{CacheStore, FreshnessPolicy, KeyPathResolver, TypeConverterRegistry};
use crate::domain::errors::{CacheResult, FetchError};
use crate::domain::models::{CacheConfig, CacheKey, FetchResult, PlainValue};

#[derive(Debug, Clone)]
pub struct ReadThroughOrchestrator {
    resolver: KeyPathResolver,
    store: CacheStore,
    freshness: FreshnessPolicy,
}

impl ReadThroughOrchestrator {
    pub const fn new(resolver: KeyPathResolver, store: CacheStore, freshness: FreshnessPolicy) -> Self {
        Self {
            resolver,
            store,
            freshness,
        }
    }

    pub fn from_config(config: &CacheConfig, converters: Arc<TypeConverterRegistry>) -> Self {
        Self::new(
            KeyPathResolver::new(&config.base_dir),
            CacheStore::new(converters),
            FreshnessPolicy::new(Duration::from_secs(config.freshness_secs)),
        )
    }

    pub const fn resolver(&self) -> &KeyPathResolver {
        &self.resolver
    }

    pub const fn store(&self) -> &CacheStore {
        &self.store
    }

    pub const fn freshness(&self) -> &FreshnessPolicy {
        &self.freshness
    }

    /// Serve `key` from the cache when fresh, otherwise run `fetch` and write
    /// its value through.
    ///
    /// `context` prefixes the message of an error result.
    pub async fn fetch<F, Fut>(&self, key: &CacheKey, ignore_cache: bool, context: &str, fetch: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PlainValue, FetchError>>,
    {
        let path = match self.resolver.resolve(key) {
            Ok(path) => Some(path),
            Err(err) if err.is_fatal() => return FetchResult::error(format!("{context}: {err}")),
            Err(err) => {
                warn!(key = %key, error = %err, "cache unavailable, serving without it");
                None
            }
        };

        if let Some(path) = path.as_ref().filter(|_| !ignore_cache) {
            if let Some(cached) = self.read_fresh(path) {
                info!(key = %key, path = %path.display(), "served from cache");
                return FetchResult::FromCache(cached);
            }
        }

        let value = match fetch().await {
            Ok(value) => value,
            Err(err) => {
                error!(key = %key, error = %err, "{context} failed");
                return FetchResult::error(format!("{context}: {err}"));
            }
        };

        if let Some(path) = path {
            match self.store.write(&path, &value) {
                Ok(()) => debug!(path = %path.display(), "cache refreshed"),
                Err(err) if err.is_fatal() => return FetchResult::error(format!("{context}: {err}")),
                Err(err) => warn!(path = %path.display(), error = %err, "cache write failed"),
            }
        }

        info!(key = %key, ignore_cache, "served from source");
        FetchResult::FromSource(value)
    }

    /// Write `value` under `key` outside of a fetch, e.g. a side snapshot.
    pub fn write_through<T: Any>(&self, key: &CacheKey, value: &T) -> CacheResult<PathBuf> {
        let path = self.resolver.resolve(key)?;
        self.store.write(&path, value)?;
        Ok(path)
    }

    /// Like [`write_through`](Self::write_through), but only fatal failures are returned.
    pub fn write_advisory<T: Any>(&self, key: &CacheKey, value: &T) -> CacheResult<()> {
        match self.write_through(key, value) {
            Ok(path) => {
                debug!(path = %path.display(), "snapshot written");
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                warn!(key = %key, error = %err, "snapshot write failed");
                Ok(())
            }
        }
    }

    fn read_fresh(&self, path: &Path) -> Option<PlainValue> {
        if !self.freshness.is_valid(path) {
            return None;
        }
        match self.store.read(path) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable cache entry, refetching");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::SourceError;
    use crate::domain::models::DataKind;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn orchestrator(base: &std::path::Path) -> ReadThroughOrchestrator {
        ReadThroughOrchestrator::from_config(
            &CacheConfig {
                base_dir: base.to_path_buf(),
                ..Default::default()
            },
            Arc::new(TypeConverterRegistry::with_defaults()),
        )
    }

    fn list_key() -> CacheKey {
        CacheKey::new("acme", "us-central1", DataKind::List)
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(PlainValue::from(vec!["a", "b"]))
        };

        let first = orchestrator.fetch(&list_key(), false, "list", fetch).await;
        let second = orchestrator.fetch(&list_key(), false, "list", fetch).await;

        assert!(matches!(first, FetchResult::FromSource(_)));
        assert!(matches!(second, FetchResult::FromCache(_)));
        assert_eq!(first.payload(), second.payload());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_ignore_cache_always_fetches() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let fetch = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(PlainValue::from("x"))
        };

        for _ in 0..3 {
            let result = orchestrator.fetch(&list_key(), true, "list", fetch).await;
            assert!(matches!(result, FetchResult::FromSource(_)));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_source_error_becomes_error_result() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());

        let result = orchestrator
            .fetch(&list_key(), false, "Error listing services", || async {
                Err(FetchError::from(SourceError::PermissionDenied("no run.services.list".to_string())))
            })
            .await;

        assert_eq!(
            result.message(),
            Some("Error listing services: Permission denied: no run.services.list")
        );
        assert!(!temp.path().join("acme/cloud-run/endpoints.json").exists());
    }

    #[tokio::test]
    async fn test_invalid_key_is_error_without_fetch() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let key = CacheKey::new("../escape", "us-central1", DataKind::List);

        let result = orchestrator
            .fetch(&key, false, "list", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(PlainValue::Null)
            })
            .await;

        assert_eq!(result.status(), crate::domain::models::FetchStatus::Error);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_a_miss() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let path = orchestrator.resolver().resolve(&list_key()).unwrap();
        std::fs::write(&path, "{ truncated").unwrap();

        let result = orchestrator
            .fetch(&list_key(), false, "list", || async { Ok(PlainValue::from(vec![1_i64])) })
            .await;

        assert!(matches!(result, FetchResult::FromSource(_)));
        assert_eq!(
            orchestrator.store().read(&path).unwrap(),
            Some(PlainValue::from(vec![1_i64]))
        );
    }

    #[tokio::test]
    async fn test_unwritable_entry_still_returns_value() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let path = orchestrator.resolver().resolve(&list_key()).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();

        let result = orchestrator
            .fetch(&list_key(), false, "list", || async { Ok(PlainValue::from("v")) })
            .await;

        assert_eq!(result, FetchResult::FromSource(PlainValue::from("v")));
    }

    #[test]
    fn test_write_advisory_swallows_io() {
        let temp = TempDir::new().unwrap();
        let orchestrator = orchestrator(temp.path());
        let key = CacheKey::new("acme", "r", DataKind::ServiceDescriptor).with_resource("api");
        let path = orchestrator.resolver().resolve(&key).unwrap();
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("occupant"), "x").unwrap();

        assert!(orchestrator.write_advisory(&key, &PlainValue::Null).is_ok());
        assert!(orchestrator.write_through(&key, &PlainValue::Null).is_err());
    }
}
