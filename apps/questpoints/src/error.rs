//! Application error type.

use questpoints_core::{LevelError, PointsError};
use thiserror::Error;

/// Errors surfaced by CLI commands and the server.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Points(#[from] PointsError),

    #[error("invalid level table: {0}")]
    Levels(#[from] LevelError),

    /// Missing or inconsistent settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client or listener setup failed.
    #[error("server error: {0}")]
    Server(String),
}
