//! # Level Sources
//!
//! Where the level table is read from.
//!
//! ```text
//! ┌──────────────┐  GET /rest/v1/levels   ┌────────────────────┐
//! │ RestLevelStore│ ────────────────────► │ hosted level table │
//! └──────┬───────┘                        └────────────────────┘
//!        │ Result<Vec<LevelDefinition>, FetchError>
//!        ▼
//! ┌──────────────────────────┐
//! │ core::levels_or_fallback │ ──► ResolvedLevels (authoritative | fallback)
//! └──────────────────────────┘
//! ```
//!
//! Sources only report what happened. Substituting the built-in table is
//! done by `questpoints_core::levels_or_fallback`.

use crate::error::AppError;
use questpoints_core::{FetchError, LevelDefinition, ResolvedLevels, levels_or_fallback, validate_levels};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Request timeout for the hosted store.
pub const REST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default table name in the hosted store.
pub const DEFAULT_TABLE: &str = "levels";

// =============================================================================
// REST STORE
// =============================================================================

/// Client for a level table exposed over PostgREST-style HTTP.
#[derive(Debug, Clone)]
pub struct RestLevelStore {
    base_url: String,
    table: String,
    client: reqwest::Client,
}

impl RestLevelStore {
    /// Create a client for `{base_url}/rest/v1/{table}`.
    ///
    /// When `api_key` is set it is sent both as the `apikey` header and
    /// as a bearer token.
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<&str>,
        table: impl Into<String>,
    ) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let apikey = HeaderValue::from_str(key)
                .map_err(|e| AppError::Config(format!("invalid REST key header: {}", e)))?;
            let bearer = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| AppError::Config(format!("invalid REST key header: {}", e)))?;
            headers.insert(HeaderName::from_static("apikey"), apikey);
            headers.insert(AUTHORIZATION, bearer);
        }

        let client = reqwest::Client::builder()
            .timeout(REST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Server(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            table: table.into(),
            client,
        })
    }

    /// Full URL of the level table endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Fetch all levels, lowest first.
    pub async fn fetch_levels(&self) -> Result<Vec<LevelDefinition>, FetchError> {
        let url = self.endpoint();
        debug!(%url, "fetching level table");

        let response = self
            .client
            .get(&url)
            .query(&[("select", "*"), ("order", "min_points.asc")])
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Unavailable(format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        let levels: Vec<LevelDefinition> =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        if levels.is_empty() {
            return Err(FetchError::Empty);
        }
        Ok(levels)
    }
}

// =============================================================================
// LEVEL SOURCE
// =============================================================================

/// A configured origin for the level table.
#[derive(Debug, Clone)]
pub enum LevelSource {
    /// No store configured; always the built-in table.
    Builtin,
    /// JSON array of level records on disk.
    File(PathBuf),
    /// Hosted table over HTTP.
    Rest(RestLevelStore),
}

impl fmt::Display for LevelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelSource::Builtin => f.write_str("builtin"),
            LevelSource::File(path) => write!(f, "file:{}", path.display()),
            LevelSource::Rest(store) => write!(f, "rest:{}", store.endpoint()),
        }
    }
}

impl LevelSource {
    /// Read the level table from this source.
    pub async fn fetch(&self) -> Result<Vec<LevelDefinition>, FetchError> {
        match self {
            LevelSource::Builtin => Err(FetchError::Unavailable(
                "no level store configured".to_string(),
            )),
            LevelSource::File(path) => {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| FetchError::Unavailable(format!("{}: {}", path.display(), e)))?;
                let levels: Vec<LevelDefinition> = serde_json::from_str(&content)
                    .map_err(|e| FetchError::Malformed(format!("{}: {}", path.display(), e)))?;
                Ok(levels)
            }
            LevelSource::Rest(store) => store.fetch_levels().await,
        }
    }
}

/// Fetch the level table and apply the fallback policy.
///
/// Never fails: on any fetch problem the built-in table comes back
/// tagged as a fallback, and the reason is logged.
pub async fn load_levels(source: &LevelSource) -> ResolvedLevels {
    let resolved = levels_or_fallback(source.fetch().await);

    if resolved.is_fallback() {
        let reason = resolved.reason.as_deref().unwrap_or("unknown");
        match source {
            LevelSource::Builtin => info!(%source, "using built-in level table"),
            _ => warn!(%source, reason, "level table unavailable, using built-in table"),
        }
    } else if let Err(e) = validate_levels(&resolved.levels) {
        warn!(%source, error = %e, "level table does not partition point totals");
    } else {
        info!(%source, count = resolved.levels.len(), "loaded level table");
    }

    resolved
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_trims_trailing_slash() {
        let store = RestLevelStore::new("https://db.example.com/", None, "levels");
        let endpoint = store.map(|s| s.endpoint()).ok();
        assert_eq!(
            endpoint.as_deref(),
            Some("https://db.example.com/rest/v1/levels")
        );
    }

    #[test]
    fn invalid_key_is_a_config_error() {
        let store = RestLevelStore::new("https://db.example.com", Some("bad\nkey"), "levels");
        assert!(matches!(store, Err(AppError::Config(_))));
    }

    #[test]
    fn display_names_the_source() {
        assert_eq!(LevelSource::Builtin.to_string(), "builtin");
        assert_eq!(
            LevelSource::File(PathBuf::from("levels.json")).to_string(),
            "file:levels.json"
        );
    }

    #[tokio::test]
    async fn builtin_source_is_a_tagged_fallback() {
        let resolved = load_levels(&LevelSource::Builtin).await;
        assert!(resolved.is_fallback());
        assert_eq!(resolved.levels.len(), 5);
    }
}
