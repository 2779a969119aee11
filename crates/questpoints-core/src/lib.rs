//! # Questpoints Core
//!
//! The deterministic progression model behind the Questpoints surfaces.
//!
//! Every function in this crate is pure: no I/O, no clocks, no shared
//! mutable state. The mobile app, the back-office and the brand panel
//! all compute levels and point totals through the same code.
//!
//! ## Modules
//!
//! - [`level`]: level definitions, the level resolver and progress
//! - [`color`]: display colors per level
//! - [`points`]: point values per action and display formatting
//! - [`source`]: fallback policy when the level table is unavailable
//!
//! ## Quick Start
//!
//! ```rust
//! use questpoints_core::{default_levels, format_points, points_for, resolve_level, PointAction};
//!
//! let levels = default_levels();
//! let earned = points_for(PointAction::Post, 5);
//! assert_eq!(format_points(earned), "100 QP");
//!
//! let level = resolve_level(earned, &levels);
//! assert_eq!(level.map(|l| l.name.as_str()), Some("Explorer"));
//! ```

pub mod color;
pub mod level;
pub mod points;
pub mod source;

pub use color::{NEUTRAL_COLOR, color_for_level, static_color};
pub use level::{
    LevelDefinition, LevelError, LevelId, LevelName, LevelProgress, count_users_per_level, default_levels,
    level_progress, resolve_level, validate_levels,
};
pub use points::{
    ActivityTally, LIKE_QP, POINT_UNIT, POST_QP, PointAction, PointsError, SHARE_QP,
    format_points, points_for,
};
pub use source::{FetchError, LevelOrigin, ResolvedLevels, levels_or_fallback};
