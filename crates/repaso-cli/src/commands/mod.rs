//! CLI subcommand modules.

pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod item;
pub mod today;
pub mod user;
pub mod weights;

use repaso_core::{Database, User};

/// Resolve the target user: by `--user <email>` when given, otherwise the
/// sole registered user.
pub(crate) fn resolve_user(
    db: &Database,
    email: Option<&str>,
) -> Result<User, Box<dyn std::error::Error>> {
    match email {
        Some(email) => db
            .user_by_email(email)?
            .ok_or_else(|| format!("no user with email {email}").into()),
        None => {
            let mut users = db.list_users()?;
            match users.len() {
                0 => Err("no users registered; run `repaso user add <email>` first".into()),
                1 => Ok(users.remove(0)),
                _ => Err("multiple users registered; pass --user <email>".into()),
            }
        }
    }
}

/// Parse a UUID argument with a friendlier error than the default.
pub(crate) fn parse_id(raw: &str) -> Result<uuid::Uuid, Box<dyn std::error::Error>> {
    uuid::Uuid::parse_str(raw).map_err(|_| format!("invalid item id: {raw}").into())
}
