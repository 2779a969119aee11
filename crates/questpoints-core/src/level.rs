//! # Level Module
//!
//! Level definitions and the level resolver.
//!
//! A level table partitions the non-negative point totals into tiers:
//! sorted by `min_points`, each tier starts one point after the previous
//! tier ends, the lowest tier starts at 0 and the highest tier is
//! unbounded. Tables read from the hosted store are not trusted to honour
//! this, so the resolver never assumes it and [`validate_levels`] reports
//! the first violation it finds.

use crate::color::static_color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// ERRORS
// =============================================================================

/// Errors raised while parsing or validating level data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    /// The name is not one of the known tiers.
    #[error("unknown level name: {0:?}")]
    UnknownName(String),

    /// The table has no levels at all.
    #[error("level table is empty")]
    Empty,

    /// The lowest tier does not start at zero points.
    #[error("lowest level {name} starts at {min_points}, expected 0")]
    DoesNotStartAtZero { name: LevelName, min_points: u64 },

    /// A tier ends before it starts.
    #[error("level {name} has max_points {max_points} below min_points {min_points}")]
    InvertedBounds {
        name: LevelName,
        min_points: u64,
        max_points: u64,
    },

    /// Point totals between two consecutive tiers belong to neither.
    #[error("no level covers {from}..={to} (between {lower} and {upper})")]
    Gap {
        lower: LevelName,
        upper: LevelName,
        from: u64,
        to: u64,
    },

    /// Two consecutive tiers both claim the same point total.
    #[error("levels {lower} and {upper} overlap at {at} points")]
    Overlap {
        lower: LevelName,
        upper: LevelName,
        at: u64,
    },

    /// An unbounded tier sits below another tier.
    #[error("level {name} is unbounded but is not the highest level")]
    UnboundedNotLast { name: LevelName },

    /// The highest tier has a finite ceiling.
    #[error("highest level {name} stops at {max_points}, expected no upper bound")]
    BoundedTop { name: LevelName, max_points: u64 },
}

// =============================================================================
// LEVEL NAME
// =============================================================================

/// The fixed set of tier names, ordered by seniority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String")]
pub enum LevelName {
    Seeker,
    Explorer,
    Achiever,
    Champion,
    Legend,
}

impl LevelName {
    /// All tiers, lowest first.
    pub const ALL: [LevelName; 5] = [
        LevelName::Seeker,
        LevelName::Explorer,
        LevelName::Achiever,
        LevelName::Champion,
        LevelName::Legend,
    ];

    /// Canonical display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LevelName::Seeker => "Seeker",
            LevelName::Explorer => "Explorer",
            LevelName::Achiever => "Achiever",
            LevelName::Champion => "Champion",
            LevelName::Legend => "Legend",
        }
    }
}

impl fmt::Display for LevelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LevelName {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        LevelName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LevelError::UnknownName(s.to_string()))
    }
}

impl TryFrom<String> for LevelName {
    type Error = LevelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// =============================================================================
// LEVEL DEFINITION
// =============================================================================

/// Opaque level identifier.
///
/// The hosted table hands these out either as text (uuid) or as integer
/// keys, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "RawLevelId")]
pub struct LevelId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawLevelId {
    Text(String),
    Number(u64),
}

impl From<RawLevelId> for LevelId {
    fn from(raw: RawLevelId) -> Self {
        match raw {
            RawLevelId::Text(text) => LevelId(text),
            RawLevelId::Number(n) => LevelId(n.to_string()),
        }
    }
}

impl LevelId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tier of the level table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    pub id: LevelId,
    pub name: LevelName,
    /// Inclusive lower bound.
    pub min_points: u64,
    /// Inclusive upper bound. `None` means unbounded.
    #[serde(default)]
    pub max_points: Option<u64>,
    pub badge_letter: char,
    pub color: String,
    /// Informational only, may be stale.
    #[serde(default)]
    pub user_count: u64,
}

impl LevelDefinition {
    /// Create a level with no users recorded.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: LevelName,
        min_points: u64,
        max_points: Option<u64>,
        badge_letter: char,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: LevelId::new(id),
            name,
            min_points,
            max_points,
            badge_letter,
            color: color.into(),
            user_count: 0,
        }
    }

    /// Check whether `points` falls in `[min_points, max_points]`.
    #[must_use]
    pub fn contains(&self, points: u64) -> bool {
        points >= self.min_points && self.max_points.is_none_or(|max| points <= max)
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.max_points.is_none()
    }
}

// =============================================================================
// DEFAULT TABLE
// =============================================================================

/// Thresholds of the built-in five-tier table: (id, name, min, max, badge).
const DEFAULT_TIERS: [(&str, LevelName, u64, Option<u64>, char); 5] = [
    ("seeker", LevelName::Seeker, 0, Some(99), 'S'),
    ("explorer", LevelName::Explorer, 100, Some(499), 'E'),
    ("achiever", LevelName::Achiever, 500, Some(1499), 'A'),
    ("champion", LevelName::Champion, 1500, Some(4999), 'C'),
    ("legend", LevelName::Legend, 5000, None, 'L'),
];

/// The built-in level table used whenever the hosted one is unavailable.
#[must_use]
pub fn default_levels() -> Vec<LevelDefinition> {
    DEFAULT_TIERS
        .iter()
        .map(|&(id, name, min, max, badge)| {
            LevelDefinition::new(id, name, min, max, badge, static_color(name))
        })
        .collect()
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Levels in ascending `min_points` order. Ties keep their input order.
fn ascending(levels: &[LevelDefinition]) -> Vec<&LevelDefinition> {
    let mut ordered: Vec<&LevelDefinition> = levels.iter().collect();
    ordered.sort_by_key(|level| level.min_points);
    ordered
}

/// Find the level a point total belongs to.
///
/// Levels are tried in ascending `min_points` order and the first one
/// containing `points` wins, whatever order the slice is in. Returns
/// `None` when no level matches.
pub fn resolve_level(points: u64, levels: &[LevelDefinition]) -> Option<&LevelDefinition> {
    ascending(levels)
        .into_iter()
        .find(|level| level.contains(points))
}

/// Check that `levels` partitions the non-negative point totals.
pub fn validate_levels(levels: &[LevelDefinition]) -> Result<(), LevelError> {
    let ordered = ascending(levels);
    let Some(first) = ordered.first() else {
        return Err(LevelError::Empty);
    };

    if first.min_points != 0 {
        return Err(LevelError::DoesNotStartAtZero {
            name: first.name,
            min_points: first.min_points,
        });
    }

    for level in &ordered {
        if let Some(max) = level.max_points {
            if max < level.min_points {
                return Err(LevelError::InvertedBounds {
                    name: level.name,
                    min_points: level.min_points,
                    max_points: max,
                });
            }
        }
    }

    for pair in ordered.windows(2) {
        let (lower, upper) = (pair[0], pair[1]);
        let Some(max) = lower.max_points else {
            return Err(LevelError::UnboundedNotLast { name: lower.name });
        };

        if upper.min_points <= max {
            return Err(LevelError::Overlap {
                lower: lower.name,
                upper: upper.name,
                at: upper.min_points,
            });
        }

        // max < upper.min_points, so max + 1 cannot overflow.
        let expected = max + 1;
        if upper.min_points > expected {
            return Err(LevelError::Gap {
                lower: lower.name,
                upper: upper.name,
                from: expected,
                to: upper.min_points - 1,
            });
        }
    }

    if let Some(last) = ordered.last() {
        if let Some(max) = last.max_points {
            return Err(LevelError::BoundedTop {
                name: last.name,
                max_points: max,
            });
        }
    }

    Ok(())
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Where a point total sits inside its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelProgress<'a> {
    pub current: &'a LevelDefinition,
    /// The next tier up, `None` at the top.
    pub next: Option<&'a LevelDefinition>,
    /// Points earned since entering `current`.
    pub points_into_level: u64,
    /// Points still missing to reach `next`.
    pub points_to_next: Option<u64>,
    /// Progress towards `next`, 0-100. Always 100 at the top.
    pub percent: u8,
}

/// Compute progress towards the next level.
///
/// Returns `None` when no level contains `points`.
pub fn level_progress(points: u64, levels: &[LevelDefinition]) -> Option<LevelProgress<'_>> {
    let ordered = ascending(levels);
    let (position, current) = ordered
        .iter()
        .copied()
        .enumerate()
        .find(|(_, level)| level.contains(points))?;
    let next = ordered.get(position + 1).copied();

    let points_into_level = points - current.min_points;

    let (points_to_next, percent) = match next {
        Some(next) if next.min_points > points => {
            // next.min_points > points >= current.min_points, so span > 0.
            let span = next.min_points - current.min_points;
            let ratio = (points_into_level as u128 * 100) / span as u128;
            (Some(next.min_points - points), ratio.min(100) as u8)
        }
        // Overlapping table: the next tier already starts at or below `points`.
        Some(_) => (Some(0), 100),
        None => (None, 100),
    };

    Some(LevelProgress {
        current,
        next,
        points_into_level,
        points_to_next,
        percent,
    })
}

// =============================================================================
// CENSUS
// =============================================================================

/// Recount users per level from their point totals.
///
/// Every level in `levels` gets an entry, including empty ones.
/// Totals that match no level are skipped. Counts are keyed by name, so
/// two rows sharing a `LevelName` share one count.
pub fn count_users_per_level(totals: &[u64], levels: &[LevelDefinition]) -> BTreeMap<LevelName, u64> {
    let ordered = ascending(levels);
    let mut counts: BTreeMap<LevelName, u64> =
        ordered.iter().map(|level| (level.name, 0)).collect();

    for &points in totals {
        if let Some(level) = ordered.iter().find(|level| level.contains(points)) {
            let count = counts.entry(level.name).or_insert(0);
            *count = count.saturating_add(1);
        }
    }

    counts
}

// =============================================================================
// TESTS
// =============================================================================
