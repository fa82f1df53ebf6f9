//! Collaborator interfaces consumed by the dispatch orchestrator.
//!
//! The orchestrator never touches storage directly; it is handed these
//! traits so tests can substitute in-memory fakes. The SQLite
//! [`Database`](crate::storage::Database) implements both.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::model::{Item, User};

/// Yields users with their notification address and scheduling profile,
/// and persists the sent marker.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All registered users.
    async fn users(&self) -> Result<Vec<User>, DatabaseError>;

    /// Persist `last_email_sent_at` for a user. Called only after a
    /// successful dispatch.
    async fn update_last_sent_at(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError>;
}

/// Yields the active items of a user, in a stable order.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn active_items(&self, user_id: Uuid) -> Result<Vec<Item>, DatabaseError>;
}
