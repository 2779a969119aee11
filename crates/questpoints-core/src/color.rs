//! # Color Module
//!
//! Display colors for level badges.
//!
//! Lookup order: the supplied level table, then the built-in table,
//! then [`NEUTRAL_COLOR`]. Lookups never fail.

use crate::level::{LevelDefinition, LevelName};

/// Color used when a name matches no known level.
pub const NEUTRAL_COLOR: &str = "#6B7280";

/// Built-in color per tier.
const LEVEL_COLORS: [(LevelName, &str); 5] = [
    (LevelName::Seeker, "#9CA3AF"),
    (LevelName::Explorer, "#3B82F6"),
    (LevelName::Achiever, "#10B981"),
    (LevelName::Champion, "#F59E0B"),
    (LevelName::Legend, "#8B5CF6"),
];

/// Built-in color for a tier.
#[must_use]
pub fn static_color(name: LevelName) -> &'static str {
    LEVEL_COLORS
        .iter()
        .find(|(candidate, _)| *candidate == name)
        .map(|(_, color)| *color)
        .unwrap_or(NEUTRAL_COLOR)
}

/// Color for a level name.
///
/// Names are matched case-insensitively. A matching entry in `levels`
/// takes precedence over the built-in table.
pub fn color_for_level<'a>(name: &str, levels: Option<&'a [LevelDefinition]>) -> &'a str {
    let Ok(name) = name.parse::<LevelName>() else {
        return NEUTRAL_COLOR;
    };

    levels
        .and_then(|levels| levels.iter().find(|level| level.name == name))
        .map(|level| level.color.as_str())
        .unwrap_or_else(|| static_color(name))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::default_levels;

    #[test]
    fn static_table_without_levels() {
        assert_eq!(color_for_level("Seeker", None), "#9CA3AF");
        assert_eq!(color_for_level("legend", None), "#8B5CF6");
    }

    #[test]
    fn supplied_levels_take_precedence() {
        let mut levels = default_levels();
        levels[0].color = "#FF0000".to_string();
        assert_eq!(color_for_level("Seeker", Some(levels.as_slice())), "#FF0000");
        assert_eq!(color_for_level("Explorer", Some(levels.as_slice())), "#3B82F6");
    }

    #[test]
    fn missing_from_supplied_levels_uses_static_table() {
        let levels = default_levels();
        let partial = &levels[..2];
        assert_eq!(color_for_level("Champion", Some(partial)), "#F59E0B");
        let empty: &[LevelDefinition] = &[];
        assert_eq!(color_for_level("Champion", Some(empty)), "#F59E0B");
    }

    #[test]
    fn unknown_name_is_neutral() {
        let levels = default_levels();
        assert_eq!(color_for_level("Wizard", None), NEUTRAL_COLOR);
        assert_eq!(color_for_level("", Some(levels.as_slice())), NEUTRAL_COLOR);
    }

    #[test]
    fn every_tier_has_a_color() {
        for name in LevelName::ALL {
            assert_ne!(static_color(name), NEUTRAL_COLOR);
        }
    }
}
