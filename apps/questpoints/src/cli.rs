//! # CLI Module
//!
//! Command definitions and handlers.
//!
//! Handlers that print take the already-resolved level table, so they
//! stay synchronous and can be driven directly from tests. The `render_*`
//! helpers return the text a handler prints.

use crate::api::{ProgressView, run_server};
use crate::config::{ServeArgs, SourceArgs};
use crate::error::AppError;
use crate::source::load_levels;
use clap::{Parser, Subcommand};
use questpoints_core::{
    ActivityTally, LevelName, PointAction, ResolvedLevels, count_users_per_level, format_points,
    points_for, validate_levels,
};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

// =============================================================================
// COMMAND LINE
// =============================================================================

/// Questpoints: levels and points for the missions platform.
#[derive(Debug, Parser)]
#[command(name = "questpoints", version, about)]
pub struct Cli {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the level for a point total
    Level {
        points: u64,
        #[arg(long)]
        json: bool,
    },

    /// Compute points for an action (POST_QP, LIKE_QP, SHARE_QP)
    Points {
        action: String,
        #[arg(default_value_t = 1)]
        count: u32,
        #[arg(long)]
        json: bool,
    },

    /// Total points for a mix of posts, likes and shares
    Tally {
        #[arg(long, default_value_t = 0)]
        posts: u32,
        #[arg(long, default_value_t = 0)]
        likes: u32,
        #[arg(long, default_value_t = 0)]
        shares: u32,
        #[arg(long)]
        json: bool,
    },

    /// Show the display color for a level name
    Color { name: String },

    /// List the active level table
    Levels {
        #[arg(long)]
        json: bool,
    },

    /// Check that the active level table covers every point total once
    LevelsCheck,

    /// Count users per level from a JSON array of point totals
    Census {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// Run the HTTP API
    Serve(ServeArgs),
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<(), AppError> {
    let source = cli.source.to_source()?;

    match cli.command {
        Commands::Level { points, json } => cmd_level(&load_levels(&source).await, points, json),
        Commands::Points {
            action,
            count,
            json,
        } => cmd_points(&action, count, json),
        Commands::Tally {
            posts,
            likes,
            shares,
            json,
        } => cmd_tally(ActivityTally::new(posts, likes, shares), json),
        Commands::Color { name } => cmd_color(&load_levels(&source).await, &name),
        Commands::Levels { json } => cmd_levels(&load_levels(&source).await, json),
        Commands::LevelsCheck => cmd_levels_check(&load_levels(&source).await),
        Commands::Census { file, json } => cmd_census(&load_levels(&source).await, &file, json),
        Commands::Serve(args) => run_server(&args, source).await,
    }
}

// =============================================================================
// RENDERING
// =============================================================================

/// Text for the `level` command.
pub fn render_level(levels: &ResolvedLevels, points: u64, json: bool) -> Result<String, AppError> {
    let level = levels.resolve(points);
    let progress = levels.progress(points);

    if json {
        let value = json!({
            "points": points,
            "formatted": format_points(points),
            "level": level,
            "progress": progress.as_ref().map(ProgressView::from),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }

    let Some(level) = level else {
        return Ok(format!("{}: no matching level", format_points(points)));
    };

    let mut output = format!(
        "{}: [{}] {} ({})",
        format_points(points),
        level.badge_letter,
        level.name,
        level.color
    );
    if let Some(progress) = progress {
        match (progress.next, progress.points_to_next) {
            (Some(next), Some(missing)) => output.push_str(&format!(
                "\n{}% to {} ({} to go)",
                progress.percent,
                next.name,
                format_points(missing)
            )),
            _ => output.push_str("\nhighest level reached"),
        }
    }
    Ok(output)
}

/// Text for the `points` command.
pub fn render_points(action: &str, count: u32, json: bool) -> Result<String, AppError> {
    let action: PointAction = action.parse()?;
    let points = points_for(action, count);

    if json {
        let value = json!({
            "action": action,
            "count": count,
            "points": points,
            "formatted": format_points(points),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(format!("{} x{} = {}", action, count, format_points(points)))
}

/// Text for the `tally` command.
pub fn render_tally(tally: ActivityTally, json: bool) -> Result<String, AppError> {
    let points = tally.total();
    if json {
        let value = json!({
            "tally": tally,
            "points": points,
            "formatted": format_points(points),
        });
        return Ok(serde_json::to_string_pretty(&value)?);
    }
    Ok(format!(
        "{} posts, {} likes, {} shares = {}",
        tally.posts,
        tally.likes,
        tally.shares,
        format_points(points)
    ))
}

/// Text for the `levels` command.
pub fn render_levels(levels: &ResolvedLevels, json: bool) -> Result<String, AppError> {
    if json {
        return Ok(serde_json::to_string_pretty(levels)?);
    }

    let mut output = format!("origin: {}\n", levels.origin);
    if let Some(reason) = &levels.reason {
        output.push_str(&format!("reason: {}\n", reason));
    }
    for level in &levels.levels {
        let upper = level
            .max_points
            .map(|max| max.to_string())
            .unwrap_or_else(|| "∞".to_string());
        output.push_str(&format!(
            "[{}] {:<9} {:>6} - {:<6} {} users={}\n",
            level.badge_letter, level.name, level.min_points, upper, level.color, level.user_count
        ));
    }
    Ok(output)
}

/// Read a census file and count users per level.
pub fn census(levels: &ResolvedLevels, file: &Path) -> Result<BTreeMap<LevelName, u64>, AppError> {
    let content = std::fs::read_to_string(file)?;
    let totals: Vec<u64> = serde_json::from_str(&content)?;
    Ok(count_users_per_level(&totals, &levels.levels))
}

// =============================================================================
// COMMAND HANDLERS
// =============================================================================

pub fn cmd_level(levels: &ResolvedLevels, points: u64, json: bool) -> Result<(), AppError> {
    println!("{}", render_level(levels, points, json)?);
    Ok(())
}

pub fn cmd_points(action: &str, count: u32, json: bool) -> Result<(), AppError> {
    println!("{}", render_points(action, count, json)?);
    Ok(())
}

pub fn cmd_tally(tally: ActivityTally, json: bool) -> Result<(), AppError> {
    println!("{}", render_tally(tally, json)?);
    Ok(())
}

pub fn cmd_color(levels: &ResolvedLevels, name: &str) -> Result<(), AppError> {
    println!("{}", levels.color(name));
    Ok(())
}

pub fn cmd_levels(levels: &ResolvedLevels, json: bool) -> Result<(), AppError> {
    print!("{}", render_levels(levels, json)?);
    Ok(())
}

pub fn cmd_levels_check(levels: &ResolvedLevels) -> Result<(), AppError> {
    validate_levels(&levels.levels)?;
    info!(origin = %levels.origin, count = levels.levels.len(), "level table is valid");
    println!("ok: {} levels ({})", levels.levels.len(), levels.origin);
    Ok(())
}

pub fn cmd_census(levels: &ResolvedLevels, file: &Path, json: bool) -> Result<(), AppError> {
    let counts = census(levels, file)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        for (name, count) in &counts {
            println!("{:<9} {}", name, count);
        }
    }
    Ok(())
}
