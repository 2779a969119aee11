//! # Questpoints Library
//!
//! This library exposes the Questpoints app modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod source;

pub use error::AppError;

// Re-export questpoints_core for convenience
pub use questpoints_core;
