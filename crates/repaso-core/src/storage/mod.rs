//! Persistent storage: SQLite database and TOML configuration.

mod config;
pub mod database;

pub use config::{Config, EmailConfig, ProfileDefaults, SweepConfig};
pub use database::{Database, RevisitOutcome};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/repaso[-dev]/` based on REPASO_ENV.
///
/// Set REPASO_ENV=dev to use a separate development data directory.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("REPASO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("repaso-dev")
    } else {
        base_dir.join("repaso")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(e.to_string()))?;
    Ok(dir)
}
