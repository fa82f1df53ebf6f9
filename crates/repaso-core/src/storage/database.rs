//! SQLite-based storage for users, items, and revisit history.
//!
//! The `Database` also implements the [`UserDirectory`] and
//! [`ItemRepository`] collaborator traits consumed by the dispatch
//! orchestrator, so production wiring is one `Arc<Database>` cloned into
//! both seams.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::data_dir;
use crate::dispatch::{ItemRepository, UserDirectory};
use crate::error::{CoreError, DatabaseError};
use crate::model::{Item, ItemStatus, Profile, RevisitEntry, User};

// === Helper Functions ===

/// Parse item status from database string
fn parse_item_status(status_str: &str) -> ItemStatus {
    match status_str {
        "retired" => ItemStatus::Retired,
        _ => ItemStatus::Active,
    }
}

/// Parse a UUID from its text form, nil on corruption
fn parse_uuid_fallback(raw: &str) -> Uuid {
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::nil())
}

/// Parse datetime from RFC3339 string with fallback to the epoch
fn parse_datetime_fallback(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_optional_datetime(raw: Option<String>) -> Option<DateTime<Utc>> {
    raw.map(|s| parse_datetime_fallback(&s))
}

/// Build an Item from a database row (column order as selected below)
fn row_to_item(row: &rusqlite::Row) -> Result<Item, rusqlite::Error> {
    let id: String = row.get(0)?;
    let user_id: String = row.get(1)?;
    let added_at: String = row.get(4)?;
    let last_revisited_at: Option<String> = row.get(5)?;
    let times_revisited: i64 = row.get(6)?;
    let status: String = row.get(7)?;

    Ok(Item {
        id: parse_uuid_fallback(&id),
        user_id: parse_uuid_fallback(&user_id),
        title: row.get(2)?,
        link: row.get(3)?,
        added_at: parse_datetime_fallback(&added_at),
        last_revisited_at: parse_optional_datetime(last_revisited_at),
        times_revisited: times_revisited.max(0) as u32,
        status: parse_item_status(&status),
        topic: row.get(8)?,
        difficulty: row.get(9)?,
        source: row.get(10)?,
        notes: row.get(11)?,
    })
}

const ITEM_COLUMNS: &str = "id, user_id, title, link, added_at, last_revisited_at, \
     times_revisited, status, topic, difficulty, source, notes";

/// Build a User from a database row
fn row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let id: String = row.get(0)?;
    let items_per_day: i64 = row.get(3)?;
    let min_revisit_days: i64 = row.get(4)?;
    let last_email_sent_at: Option<String> = row.get(6)?;
    let created_at: String = row.get(7)?;

    Ok(User {
        id: parse_uuid_fallback(&id),
        email: row.get(1)?,
        name: row.get(2)?,
        profile: Profile {
            items_per_day: items_per_day.max(0) as u32,
            min_revisit_days: min_revisit_days.max(0) as u32,
            email_time: row.get(5)?,
            last_email_sent_at: parse_optional_datetime(last_email_sent_at),
        },
        created_at: parse_datetime_fallback(&created_at),
    })
}

const USER_COLUMNS: &str = "id, email, name, items_per_day, min_revisit_days, \
     email_time, last_email_sent_at, created_at";

/// Result of attempting to record a revisit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisitOutcome {
    /// History entry inserted, counters bumped.
    Recorded,
    /// The item was already revisited today; nothing changed.
    AlreadyToday,
}

/// SQLite database for users, items, and revisit history.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/repaso/repaso.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("repaso.db");
        let conn = Connection::open(&path).map_err(|source| DatabaseError::OpenFailed {
            path: path.clone(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (tests and ephemeral runs).
    pub fn open_memory() -> Result<Self, CoreError> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        // The storage layer manages referential integrity by hand (manual
        // cascade in `delete_item`, rowcount-based existence checks in
        // `record_revisit`), relying on SQLite's documented default of
        // foreign-key enforcement being off. The bundled SQLite build flips
        // that default on, so restore it explicitly to match the assumed
        // semantics.
        self.lock()
            .execute_batch("PRAGMA foreign_keys = OFF;")?;
        self.lock()
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS users (
                    id                 TEXT PRIMARY KEY,
                    email              TEXT NOT NULL UNIQUE,
                    name               TEXT NOT NULL DEFAULT '',
                    items_per_day      INTEGER NOT NULL DEFAULT 3,
                    min_revisit_days   INTEGER NOT NULL DEFAULT 2,
                    email_time         TEXT,
                    last_email_sent_at TEXT,
                    created_at         TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS items (
                    id                 TEXT PRIMARY KEY,
                    user_id            TEXT NOT NULL REFERENCES users(id),
                    title              TEXT NOT NULL,
                    link               TEXT NOT NULL DEFAULT '',
                    added_at           TEXT NOT NULL,
                    last_revisited_at  TEXT,
                    times_revisited    INTEGER NOT NULL DEFAULT 0,
                    status             TEXT NOT NULL DEFAULT 'active',
                    topic              TEXT,
                    difficulty         TEXT,
                    source             TEXT NOT NULL DEFAULT 'other',
                    notes              TEXT
                );

                CREATE TABLE IF NOT EXISTS revisit_history (
                    id           TEXT PRIMARY KEY,
                    item_id      TEXT NOT NULL REFERENCES items(id),
                    revisited_at TEXT NOT NULL,
                    notes        TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_items_user_status ON items(user_id, status);
                CREATE INDEX IF NOT EXISTS idx_revisit_history_item
                    ON revisit_history(item_id, revisited_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -- Users ----------------------------------------------------------

    /// Register a user with the given scheduling profile.
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        profile: Profile,
        now: DateTime<Utc>,
    ) -> Result<User, DatabaseError> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            profile,
            created_at: now,
        };
        self.lock().execute(
            "INSERT INTO users (id, email, name, items_per_day, min_revisit_days,
                                email_time, last_email_sent_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.profile.items_per_day,
                user.profile.min_revisit_days,
                user.profile.email_time,
                user.profile.last_email_sent_at.map(|t| t.to_rfc3339()),
                user.created_at.to_rfc3339(),
            ],
        )?;
        Ok(user)
    }

    pub fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC"
        ))?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(users)
    }

    pub fn user_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let conn = self.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn user_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let conn = self.lock();
        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    /// Overwrite a user's scheduling profile.
    pub fn update_profile(&self, user_id: Uuid, profile: &Profile) -> Result<(), DatabaseError> {
        let updated = self.lock().execute(
            "UPDATE users SET items_per_day = ?1, min_revisit_days = ?2, email_time = ?3
             WHERE id = ?4",
            params![
                profile.items_per_day,
                profile.min_revisit_days,
                profile.email_time,
                user_id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    /// Persist the sent marker after a successful dispatch.
    pub fn set_last_sent_at(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let updated = self.lock().execute(
            "UPDATE users SET last_email_sent_at = ?1 WHERE id = ?2",
            params![at.to_rfc3339(), user_id.to_string()],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "user",
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    // -- Items ----------------------------------------------------------

    pub fn create_item(&self, item: &Item) -> Result<(), DatabaseError> {
        self.lock().execute(
            "INSERT INTO items (id, user_id, title, link, added_at, last_revisited_at,
                                times_revisited, status, topic, difficulty, source, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                item.id.to_string(),
                item.user_id.to_string(),
                item.title,
                item.link,
                item.added_at.to_rfc3339(),
                item.last_revisited_at.map(|t| t.to_rfc3339()),
                item.times_revisited,
                item.status.as_str(),
                item.topic,
                item.difficulty,
                item.source,
                item.notes,
            ],
        )?;
        Ok(())
    }

    /// Items for display, newest first. `include_retired` widens the listing
    /// beyond active items.
    pub fn list_items(&self, user_id: Uuid, include_retired: bool) -> Result<Vec<Item>, DatabaseError> {
        let conn = self.lock();
        let sql = if include_retired {
            format!(
                "SELECT {ITEM_COLUMNS} FROM items WHERE user_id = ?1 ORDER BY added_at DESC"
            )
        } else {
            format!(
                "SELECT {ITEM_COLUMNS} FROM items
                 WHERE user_id = ?1 AND status = 'active' ORDER BY added_at DESC"
            )
        };
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params![user_id.to_string()], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Active items in a stable order (oldest first, id tiebreak). The
    /// day-stable selection depends on this ordering not changing between
    /// calls within a day.
    pub fn active_items_stable(&self, user_id: Uuid) -> Result<Vec<Item>, DatabaseError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ITEM_COLUMNS} FROM items
             WHERE user_id = ?1 AND status = 'active' ORDER BY added_at ASC, id ASC"
        ))?;
        let items = stmt
            .query_map(params![user_id.to_string()], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    pub fn item_by_id(&self, id: Uuid) -> Result<Option<Item>, DatabaseError> {
        let conn = self.lock();
        let item = conn
            .query_row(
                &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
                params![id.to_string()],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// Update user-editable item fields.
    pub fn update_item(&self, item: &Item) -> Result<(), DatabaseError> {
        let updated = self.lock().execute(
            "UPDATE items SET title = ?1, link = ?2, topic = ?3, difficulty = ?4,
                              source = ?5, notes = ?6
             WHERE id = ?7",
            params![
                item.title,
                item.link,
                item.topic,
                item.difficulty,
                item.source,
                item.notes,
                item.id.to_string(),
            ],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "item",
                id: item.id.to_string(),
            });
        }
        Ok(())
    }

    /// Retire an item so it no longer participates in scheduling.
    pub fn archive_item(&self, id: Uuid) -> Result<(), DatabaseError> {
        let updated = self.lock().execute(
            "UPDATE items SET status = 'retired' WHERE id = ?1",
            params![id.to_string()],
        )?;
        if updated == 0 {
            return Err(DatabaseError::NotFound {
                entity: "item",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    /// Permanently delete an item and its revisit history.
    pub fn delete_item(&self, id: Uuid) -> Result<(), DatabaseError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM revisit_history WHERE item_id = ?1",
            params![id.to_string()],
        )?;
        let deleted = tx.execute("DELETE FROM items WHERE id = ?1", params![id.to_string()])?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound {
                entity: "item",
                id: id.to_string(),
            });
        }
        tx.commit()?;
        Ok(())
    }

    // -- Revisits -------------------------------------------------------

    /// Record a revisit: insert a history entry and bump the item's
    /// counters, at most once per calendar day.
    ///
    /// `day_bounds` are the UTC instants bounding the current local day
    /// (see [`Clock::day_bounds`](crate::clock::Clock::day_bounds)).
    pub fn record_revisit(
        &self,
        item_id: Uuid,
        notes: Option<&str>,
        now: DateTime<Utc>,
        day_bounds: (DateTime<Utc>, DateTime<Utc>),
    ) -> Result<RevisitOutcome, DatabaseError> {
        let mut conn = self.lock();

        let already: i64 = conn.query_row(
            "SELECT COUNT(*) FROM revisit_history
             WHERE item_id = ?1 AND revisited_at >= ?2 AND revisited_at < ?3",
            params![
                item_id.to_string(),
                day_bounds.0.to_rfc3339(),
                day_bounds.1.to_rfc3339(),
            ],
            |row| row.get(0),
        )?;
        if already > 0 {
            return Ok(RevisitOutcome::AlreadyToday);
        }

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO revisit_history (id, item_id, revisited_at, notes)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                item_id.to_string(),
                now.to_rfc3339(),
                notes,
            ],
        )?;
        let updated = tx.execute(
            "UPDATE items
             SET times_revisited = times_revisited + 1, last_revisited_at = ?1
             WHERE id = ?2",
            params![now.to_rfc3339(), item_id.to_string()],
        )?;
        if updated == 0 {
            // Transaction drops without commit, rolling back the insert.
            return Err(DatabaseError::NotFound {
                entity: "item",
                id: item_id.to_string(),
            });
        }
        tx.commit()?;
        Ok(RevisitOutcome::Recorded)
    }

    /// Whether an item has a revisit inside `[start, end)`.
    pub fn revisited_between(
        &self,
        item_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let count: i64 = self.lock().query_row(
            "SELECT COUNT(*) FROM revisit_history
             WHERE item_id = ?1 AND revisited_at >= ?2 AND revisited_at < ?3",
            params![item_id.to_string(), start.to_rfc3339(), end.to_rfc3339()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Revisit history for an item, newest first.
    pub fn revisit_history(&self, item_id: Uuid) -> Result<Vec<RevisitEntry>, DatabaseError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, item_id, revisited_at, notes FROM revisit_history
             WHERE item_id = ?1 ORDER BY revisited_at DESC",
        )?;
        let entries = stmt
            .query_map(params![item_id.to_string()], |row| {
                let id: String = row.get(0)?;
                let entry_item_id: String = row.get(1)?;
                let revisited_at: String = row.get(2)?;
                Ok(RevisitEntry {
                    id: parse_uuid_fallback(&id),
                    item_id: parse_uuid_fallback(&entry_item_id),
                    revisited_at: parse_datetime_fallback(&revisited_at),
                    notes: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

// === Collaborator trait implementations ===

#[async_trait]
impl UserDirectory for Database {
    async fn users(&self) -> Result<Vec<User>, DatabaseError> {
        self.list_users()
    }

    async fn update_last_sent_at(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        self.set_last_sent_at(user_id, at)
    }
}

#[async_trait]
impl ItemRepository for Database {
    async fn active_items(&self, user_id: Uuid) -> Result<Vec<Item>, DatabaseError> {
        self.active_items_stable(user_id)
    }
}
