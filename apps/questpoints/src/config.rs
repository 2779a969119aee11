//! # Configuration
//!
//! Settings shared by every command. Each flag can also come from the
//! environment (`QP_*`), flags win.

use crate::error::AppError;
use crate::source::{DEFAULT_TABLE, LevelSource, RestLevelStore};
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Which kind of level source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    Builtin,
    File,
    Rest,
}

/// Level source settings.
#[derive(Debug, Clone, Args)]
pub struct SourceArgs {
    /// Where to read the level table from
    #[arg(long, global = true, env = "QP_SOURCE", value_enum, default_value = "builtin")]
    pub source: SourceKind,

    /// JSON file with level records (for --source file)
    #[arg(long, global = true, env = "QP_LEVELS_FILE")]
    pub levels_file: Option<PathBuf>,

    /// Base URL of the hosted store (for --source rest)
    #[arg(long, global = true, env = "QP_REST_URL")]
    pub rest_url: Option<String>,

    /// API key for the hosted store
    #[arg(long, global = true, env = "QP_REST_KEY", hide_env_values = true)]
    pub rest_key: Option<String>,

    /// Table holding level records
    #[arg(long, global = true, env = "QP_REST_TABLE", default_value = DEFAULT_TABLE)]
    pub rest_table: String,
}

impl Default for SourceArgs {
    fn default() -> Self {
        Self {
            source: SourceKind::Builtin,
            levels_file: None,
            rest_url: None,
            rest_key: None,
            rest_table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl SourceArgs {
    /// Build the configured level source.
    pub fn to_source(&self) -> Result<LevelSource, AppError> {
        match self.source {
            SourceKind::Builtin => Ok(LevelSource::Builtin),
            SourceKind::File => {
                let path = self.levels_file.clone().ok_or_else(|| {
                    AppError::Config("--source file requires --levels-file".to_string())
                })?;
                Ok(LevelSource::File(path))
            }
            SourceKind::Rest => {
                let url = self.rest_url.as_deref().ok_or_else(|| {
                    AppError::Config("--source rest requires --rest-url".to_string())
                })?;
                let store =
                    RestLevelStore::new(url, self.rest_key.as_deref(), self.rest_table.clone())?;
                Ok(LevelSource::Rest(store))
            }
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Args)]
pub struct ServeArgs {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    pub port: u16,

    /// Require `Authorization: Bearer <key>` on every route but /health
    #[arg(long, env = "QP_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Seconds between level table refreshes (0 disables)
    #[arg(long, default_value_t = 300)]
    pub refresh_secs: u64,

    /// Requests per second accepted across all clients
    #[arg(long, default_value_t = 50)]
    pub rate_limit: u32,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            api_key: None,
            refresh_secs: 300,
            rate_limit: 50,
        }
    }
}

impl ServeArgs {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `None` when periodic refresh is disabled.
    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_secs > 0).then(|| Duration::from_secs(self.refresh_secs))
    }

    /// Empty keys count as no key.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }
}
