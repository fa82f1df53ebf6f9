//! Shared data model: items under scheduling, users, and revisit history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an item. Only `Active` items participate in
/// scheduling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Active,
    Retired,
}

impl ItemStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Active => "active",
            ItemStatus::Retired => "retired",
        }
    }
}

/// A trackable unit under spaced-repetition scheduling.
///
/// The engine only reads items; the revisit-recording and archive actions
/// mutate them through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub link: String,
    pub added_at: DateTime<Utc>,
    pub last_revisited_at: Option<DateTime<Utc>>,
    pub times_revisited: u32,
    pub status: ItemStatus,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_source() -> String {
    "other".to_string()
}

impl Item {
    /// Create a fresh active item added at `now`, never revisited.
    pub fn new(user_id: Uuid, title: impl Into<String>, link: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            link: link.into(),
            added_at: now,
            last_revisited_at: None,
            times_revisited: 0,
            status: ItemStatus::Active,
            topic: None,
            difficulty: None,
            source: default_source(),
            notes: None,
        }
    }
}

/// A single recorded revisit of an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisitEntry {
    pub id: Uuid,
    pub item_id: Uuid,
    pub revisited_at: DateTime<Utc>,
    pub notes: Option<String>,
}

/// Per-user scheduling preferences, read by the engine.
///
/// `last_email_sent_at` is the only field the engine writes back, and only
/// after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// How many items a daily dispatch selects.
    pub items_per_day: u32,
    /// Minimum days since the last revisit before an item is eligible again.
    pub min_revisit_days: u32,
    /// Earliest local time of day (`HH:MM`) a dispatch may go out.
    /// `None` means "send as soon as the sweep reaches the user".
    pub email_time: Option<String>,
    /// When the last successful dispatch happened.
    pub last_email_sent_at: Option<DateTime<Utc>>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            items_per_day: 3,
            min_revisit_days: 2,
            email_time: None,
            last_email_sent_at: None,
        }
    }
}

/// A registered user with a notification address and scheduling profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub profile: Profile,
    pub created_at: DateTime<Utc>,
}
