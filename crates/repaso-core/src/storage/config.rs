//! TOML-based application configuration.
//!
//! Stores:
//! - Sweep timing (tick interval, per-send timeout)
//! - Email sender settings (API endpoint, key, from address)
//! - Profile defaults applied to newly created users
//!
//! Configuration is stored at `~/.config/repaso/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Sweep timing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Seconds between timer-driven sweeps.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Upper bound on a single notification send.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            send_timeout_secs: default_send_timeout_secs(),
        }
    }
}

/// Email sender configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    /// Resend-compatible endpoint.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// API key. Falls back to the RESEND_API_KEY environment variable;
    /// with neither set, the sender runs in simulation mode.
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_from")]
    pub from: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: None,
            from: default_from(),
        }
    }
}

impl EmailConfig {
    /// Configured key, or the RESEND_API_KEY environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()))
    }
}

/// Scheduling profile defaults for newly created users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileDefaults {
    #[serde(default = "default_items_per_day")]
    pub items_per_day: u32,
    #[serde(default = "default_min_revisit_days")]
    pub min_revisit_days: u32,
    /// Optional `HH:MM` local send gate applied to new users.
    #[serde(default)]
    pub email_time: Option<String>,
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            items_per_day: default_items_per_day(),
            min_revisit_days: default_min_revisit_days(),
            email_time: None,
        }
    }
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/repaso/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sweep: SweepConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub profile_defaults: ProfileDefaults,
}

// Default functions
fn default_interval_secs() -> u64 {
    60
}
fn default_send_timeout_secs() -> u64 {
    30
}
fn default_api_url() -> String {
    "https://api.resend.com/emails".to_string()
}
fn default_from() -> String {
    "onboarding@resend.dev".to_string()
}
fn default_items_per_day() -> u32 {
    3
}
fn default_min_revisit_days() -> u32 {
    2
}

impl Config {
    /// Path of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load configuration, falling back to defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Persist configuration as pretty TOML.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        self.save_to(&path)
    }

    /// Persist configuration to an explicit path.
    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(path, raw).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}
