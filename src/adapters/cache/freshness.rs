use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::debug;

/// Age after which a cache entry is refetched unless configured otherwise.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(3600);

/// Time-to-live check on a cache file's modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    window: Duration,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

impl FreshnessPolicy {
    /// Entries younger than `window` are fresh.
    pub const fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Maximum age of a fresh entry.
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Whether `path` exists and was written less than one window ago.
    pub fn is_valid(&self, path: &Path) -> bool {
        self.is_valid_at(path, SystemTime::now())
    }

    /// [`Self::is_valid`] measured against `now`.
    pub fn is_valid_at(&self, path: &Path, now: SystemTime) -> bool {
        let modified = match std::fs::metadata(path).and_then(|meta| meta.modified()) {
            Ok(modified) => modified,
            Err(_) => {
                debug!(path = %path.display(), "no cache entry");
                return false;
            }
        };

        let fresh = self.is_fresh(modified, now);
        if !fresh {
            debug!(path = %path.display(), window_secs = self.window.as_secs(), "cache entry expired");
        }
        fresh
    }

    /// An entry stamped in the future (clock skew) counts as fresh.
    pub fn is_fresh(&self, written_at: SystemTime, now: SystemTime) -> bool {
        match now.duration_since(written_at) {
            Ok(age) => age < self.window,
            Err(_) => true,
        }
    }
}
