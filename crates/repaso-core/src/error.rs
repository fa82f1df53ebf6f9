//! Core error types for repaso-core.
//!
//! This module defines the error hierarchy using thiserror so callers can
//! match on specific failure classes instead of string inspection.

use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// Core error type for repaso-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),

    /// Dispatch sweep errors
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Row lookup found nothing
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    /// Data directory could not be resolved or created
    #[error("Failed to prepare data directory: {0}")]
    DataDir(String),
}

/// Notification-delivery errors.
///
/// The dispatch engine only needs success vs failure plus a diagnostic
/// message; these variants exist so the message is a useful one.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// The HTTP request itself failed (connect, TLS, ...)
    #[error("Email request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The email API rejected the request
    #[error("Email API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Delivery did not complete within the dispatch timeout
    #[error("Notification send timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

/// Dispatch sweep errors.
///
/// Per-user failures are isolated inside the sweep and never surface here;
/// these are the sweep-level conditions only.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Users could not be enumerated at all -- the sweep aborts
    #[error("Failed to enumerate users: {0}")]
    UserEnumeration(String),

    /// A per-user operation was requested for an unknown user
    #[error("Unknown user: {user_id}")]
    UnknownUser { user_id: Uuid },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(err, _msg) => {
                if err.code == rusqlite::ErrorCode::DatabaseLocked {
                    DatabaseError::Locked
                } else {
                    DatabaseError::QueryFailed(err.to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
