//! # Points Module
//!
//! Point values per user action and their display format.
//!
//! The per-action values are policy constants. Counts are unsigned, so a
//! negative repetition count cannot be expressed, and the products fit
//! in a `u64` for any `u32` count.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Points for publishing a post.
pub const POST_QP: u64 = 20;

/// Points for a like.
pub const LIKE_QP: u64 = 1;

/// Points for a share.
pub const SHARE_QP: u64 = 10;

/// Unit suffix used by [`format_points`].
pub const POINT_UNIT: &str = "QP";

/// Errors raised while reading point actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointsError {
    #[error("unknown point action: {0:?} (expected POST_QP, LIKE_QP or SHARE_QP)")]
    UnknownAction(String),
}

/// A user action that earns points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
pub enum PointAction {
    Post,
    Like,
    Share,
}

impl PointAction {
    pub const ALL: [PointAction; 3] = [PointAction::Post, PointAction::Like, PointAction::Share];

    /// Points earned by one occurrence of this action.
    #[must_use]
    pub fn value(&self) -> u64 {
        match self {
            PointAction::Post => POST_QP,
            PointAction::Like => LIKE_QP,
            PointAction::Share => SHARE_QP,
        }
    }

    /// Points for a single occurrence. Same as `points_for(action, 1)`.
    #[must_use]
    pub fn points(&self) -> u64 {
        points_for(*self, 1)
    }

    /// Wire token, e.g. `POST_QP`.
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            PointAction::Post => "POST_QP",
            PointAction::Like => "LIKE_QP",
            PointAction::Share => "SHARE_QP",
        }
    }
}

impl fmt::Display for PointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.token())
    }
}

impl FromStr for PointAction {
    type Err = PointsError;

    /// Accepts the wire tokens and the bare action words, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        match token.as_str() {
            "POST_QP" | "POST" => Ok(PointAction::Post),
            "LIKE_QP" | "LIKE" => Ok(PointAction::Like),
            "SHARE_QP" | "SHARE" => Ok(PointAction::Share),
            _ => Err(PointsError::UnknownAction(s.to_string())),
        }
    }
}

impl TryFrom<String> for PointAction {
    type Error = PointsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PointAction> for &'static str {
    fn from(action: PointAction) -> Self {
        action.token()
    }
}

/// Points earned by `count` occurrences of `action`.
#[must_use]
pub fn points_for(action: PointAction, count: u32) -> u64 {
    u64::from(count) * action.value()
}

/// Render a point total as `"<n> QP"`, without separators.
#[must_use]
pub fn format_points(points: u64) -> String {
    format!("{} {}", points, POINT_UNIT)
}

/// Activity counts for one user, as shown in back-office views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityTally {
    #[serde(default)]
    pub posts: u32,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub shares: u32,
}

impl ActivityTally {
    #[must_use]
    pub fn new(posts: u32, likes: u32, shares: u32) -> Self {
        Self {
            posts,
            likes,
            shares,
        }
    }

    /// Record `count` more occurrences of `action`.
    pub fn record(&mut self, action: PointAction, count: u32) {
        let slot = match action {
            PointAction::Post => &mut self.posts,
            PointAction::Like => &mut self.likes,
            PointAction::Share => &mut self.shares,
        };
        *slot = slot.saturating_add(count);
    }

    /// Total points for the tallied activity.
    #[must_use]
    pub fn total(&self) -> u64 {
        points_for(PointAction::Post, self.posts)
            + points_for(PointAction::Like, self.likes)
            + points_for(PointAction::Share, self.shares)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_action_totals() {
        assert_eq!(points_for(PointAction::Post, 5), 100);
        assert_eq!(points_for(PointAction::Like, 100), 100);
        assert_eq!(points_for(PointAction::Share, 10), 100);
    }

    #[test]
    fn mixed_activity_sums_to_300() {
        let total = points_for(PointAction::Post, 5)
            + points_for(PointAction::Like, 100)
            + points_for(PointAction::Share, 10);
        assert_eq!(total, 300);
        assert_eq!(ActivityTally::new(5, 100, 10).total(), 300);
    }

    #[test]
    fn single_occurrence_default() {
        assert_eq!(PointAction::Post.points(), 20);
        assert_eq!(PointAction::Like.points(), 1);
        assert_eq!(PointAction::Share.points(), 10);
    }

    #[test]
    fn zero_count_earns_nothing() {
        for action in PointAction::ALL {
            assert_eq!(points_for(action, 0), 0);
        }
    }

    #[test]
    fn largest_count_does_not_overflow() {
        assert_eq!(points_for(PointAction::Post, u32::MAX), u64::from(u32::MAX) * 20);
    }

    #[test]
    fn formatting() {
        assert_eq!(format_points(0), "0 QP");
        assert_eq!(format_points(1500), "1500 QP");
        assert_eq!(format_points(1_000_000), "1000000 QP");
    }

    #[test]
    fn action_tokens() {
        assert_eq!("POST_QP".parse::<PointAction>(), Ok(PointAction::Post));
        assert_eq!("like_qp".parse::<PointAction>(), Ok(PointAction::Like));
        assert_eq!("share".parse::<PointAction>(), Ok(PointAction::Share));
        assert_eq!(
            "COMMENT_QP".parse::<PointAction>(),
            Err(PointsError::UnknownAction("COMMENT_QP".to_string()))
        );
        assert_eq!(PointAction::Share.to_string(), "SHARE_QP");
    }

    #[test]
    fn action_serde_uses_tokens() {
        let json = serde_json::to_string(&PointAction::Post).ok();
        assert_eq!(json.as_deref(), Some("\"POST_QP\""));

        let parsed: Result<PointAction, _> = serde_json::from_str("\"like\"");
        assert!(parsed.is_ok_and(|a| a == PointAction::Like));

        let unknown: Result<PointAction, _> = serde_json::from_str("\"BOOST_QP\"");
        assert!(unknown.is_err());
    }

    #[test]
    fn tally_records_actions() {
        let mut tally = ActivityTally::default();
        tally.record(PointAction::Post, 2);
        tally.record(PointAction::Like, 3);
        tally.record(PointAction::Post, 1);
        assert_eq!(tally, ActivityTally::new(3, 3, 0));
        assert_eq!(tally.total(), 63);
    }

    mod properties {
        use crate::points::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn points_are_linear_in_count(a in 0u32..100_000, b in 0u32..100_000) {
                for action in PointAction::ALL {
                    prop_assert_eq!(
                        points_for(action, a) + points_for(action, b),
                        points_for(action, a + b)
                    );
                }
            }

            #[test]
            fn format_is_plain_digits(points in any::<u64>()) {
                let formatted = format_points(points);
                prop_assert_eq!(formatted.clone(), format_points(points));
                prop_assert_eq!(formatted, format!("{points} QP"));
            }
        }
    }
}
