//! # Source Module
//!
//! Fallback policy for the level table.
//!
//! Transports (hosted REST table, local file) live in the app layer and
//! report their outcome as `Result<Vec<LevelDefinition>, FetchError>`.
//! [`levels_or_fallback`] turns that outcome into the table callers use:
//! the fetched one when it is usable, the built-in five-tier table
//! otherwise. Callers never see a level-lookup error.

use crate::color::color_for_level;
use crate::level::{LevelDefinition, LevelProgress, default_levels, level_progress, resolve_level};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why the authoritative level table could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The store could not be reached or refused the request.
    #[error("level store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with no levels.
    #[error("level store returned no levels")]
    Empty,

    /// The store answered with data that is not a level table.
    #[error("malformed level data: {0}")]
    Malformed(String),
}

/// Where the active level table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelOrigin {
    Authoritative,
    Fallback,
}

impl fmt::Display for LevelOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelOrigin::Authoritative => f.write_str("authoritative"),
            LevelOrigin::Fallback => f.write_str("fallback"),
        }
    }
}

/// The level table in use, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLevels {
    pub levels: Vec<LevelDefinition>,
    pub origin: LevelOrigin,
    /// Set when `origin` is `Fallback`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ResolvedLevels {
    /// Built-in table, tagged as a fallback for `reason`.
    #[must_use]
    pub fn fallback(reason: &FetchError) -> Self {
        Self {
            levels: default_levels(),
            origin: LevelOrigin::Fallback,
            reason: Some(reason.to_string()),
        }
    }

    #[must_use]
    pub fn is_fallback(&self) -> bool {
        self.origin == LevelOrigin::Fallback
    }

    pub fn resolve(&self, points: u64) -> Option<&LevelDefinition> {
        resolve_level(points, &self.levels)
    }

    pub fn progress(&self, points: u64) -> Option<LevelProgress<'_>> {
        level_progress(points, &self.levels)
    }

    pub fn color(&self, name: &str) -> &str {
        color_for_level(name, Some(self.levels.as_slice()))
    }
}

/// Pick the level table to use from a fetch outcome.
///
/// A non-empty fetched table is used as is. An empty table or a fetch
/// error yields the built-in table with the reason recorded.
#[must_use]
pub fn levels_or_fallback(fetched: Result<Vec<LevelDefinition>, FetchError>) -> ResolvedLevels {
    match fetched {
        Ok(levels) if !levels.is_empty() => ResolvedLevels {
            levels,
            origin: LevelOrigin::Authoritative,
            reason: None,
        },
        Ok(_) => ResolvedLevels::fallback(&FetchError::Empty),
        Err(err) => ResolvedLevels::fallback(&err),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelName;

    #[test]
    fn fetched_table_is_authoritative() {
        let mut fetched = default_levels();
        fetched[0].color = "#000000".to_string();

        let resolved = levels_or_fallback(Ok(fetched.clone()));
        assert_eq!(resolved.origin, LevelOrigin::Authoritative);
        assert_eq!(resolved.levels, fetched);
        assert!(resolved.reason.is_none());
        assert_eq!(resolved.color("Seeker"), "#000000");
    }

    #[test]
    fn empty_table_falls_back() {
        let resolved = levels_or_fallback(Ok(Vec::new()));
        assert!(resolved.is_fallback());
        assert_eq!(resolved.levels, default_levels());
        assert_eq!(resolved.reason.as_deref(), Some("level store returned no levels"));
    }

    #[test]
    fn fetch_error_falls_back_with_reason() {
        let err = FetchError::Unavailable("connection refused".to_string());
        let resolved = levels_or_fallback(Err(err));
        assert!(resolved.is_fallback());
        assert_eq!(resolved.levels.len(), 5);
        assert!(
            resolved
                .reason
                .as_deref()
                .is_some_and(|r| r.contains("connection refused"))
        );
    }

    #[test]
    fn fallback_table_resolves_like_default() {
        let resolved = levels_or_fallback(Err(FetchError::Malformed("bad json".into())));
        assert_eq!(resolved.resolve(0).map(|l| l.name), Some(LevelName::Seeker));
        assert_eq!(resolved.resolve(5000).map(|l| l.name), Some(LevelName::Legend));
        assert_eq!(resolved.progress(250).map(|p| p.points_to_next), Some(Some(250)));
    }

    #[test]
    fn origin_serializes_snake_case() {
        let json = serde_json::to_string(&LevelOrigin::Fallback).ok();
        assert_eq!(json.as_deref(), Some("\"fallback\""));
    }
}
