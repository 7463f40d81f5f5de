//! Bearer tokens for the Google APIs.
//!
//! A configured token is used as-is. Otherwise the token is obtained from
//! `gcloud auth print-access-token` and reused until shortly before the
//! usual one-hour expiry.

use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::sync::Mutex;

use crate::domain::errors::{SourceError, SourceResult};

/// gcloud tokens live one hour; refresh a little earlier.
const GCLOUD_TOKEN_LIFETIME: Duration = Duration::from_secs(50 * 60);

#[derive(Debug)]
struct CachedToken {
    value: String,
    fetched_at: Instant,
}

/// Supplies the `Authorization: Bearer` value for every request.
#[derive(Debug)]
pub struct AccessTokenProvider {
    static_token: Option<String>,
    gcloud_path: String,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    /// Always hand out `token`.
    pub fn fixed(token: impl Into<String>) -> Self {
        Self {
            static_token: Some(token.into()),
            gcloud_path: String::new(),
            cached: Mutex::new(None),
        }
    }

    /// Ask the gcloud binary at `gcloud_path`.
    pub fn gcloud(gcloud_path: impl Into<String>) -> Self {
        Self {
            static_token: None,
            gcloud_path: gcloud_path.into(),
            cached: Mutex::new(None),
        }
    }

    /// Static token when one is configured and non-empty, gcloud otherwise.
    pub fn from_settings(access_token: Option<&str>, gcloud_path: &str) -> Self {
        match access_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => Self::fixed(token),
            None => Self::gcloud(gcloud_path),
        }
    }

    pub async fn token(&self) -> SourceResult<String> {
        if let Some(token) = &self.static_token {
            return Ok(token.clone());
        }

        let mut cached = self.cached.lock().await;
        if let Some(entry) = cached.as_ref() {
            if entry.fetched_at.elapsed() < GCLOUD_TOKEN_LIFETIME {
                return Ok(entry.value.clone());
            }
        }

        let value = self.print_access_token().await?;
        *cached = Some(CachedToken {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    async fn print_access_token(&self) -> SourceResult<String> {
        tracing::debug!(gcloud = %self.gcloud_path, "requesting access token from gcloud");

        let output = Command::new(&self.gcloud_path)
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| SourceError::Authentication(format!("could not run {}: {e}", self.gcloud_path)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SourceError::Authentication(format!(
                "gcloud auth print-access-token failed: {}",
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(SourceError::Authentication(
                "gcloud returned an empty access token".to_string(),
            ));
        }
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixed_token() {
        let provider = AccessTokenProvider::fixed("abc");
        assert_eq!(provider.token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn test_blank_setting_falls_back_to_gcloud() {
        let provider = AccessTokenProvider::from_settings(Some("  "), "/nonexistent/gcloud");
        let err = provider.token().await.unwrap_err();
        assert!(matches!(err, SourceError::Authentication(_)));
    }

    #[tokio::test]
    async fn test_configured_token_wins() {
        let provider = AccessTokenProvider::from_settings(Some("tok"), "/nonexistent/gcloud");
        assert_eq!(provider.token().await.unwrap(), "tok");
    }
}
