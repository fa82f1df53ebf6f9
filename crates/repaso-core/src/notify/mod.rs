//! Outbound notification senders.
//!
//! The dispatch orchestrator only sees the [`NotificationSender`] trait;
//! the concrete sender POSTs to a Resend-compatible email API, or logs the
//! rendered message when no API key is configured (development mode).

mod email;

pub use email::EmailSender;

use async_trait::async_trait;

use crate::error::NotifyError;
use crate::model::Item;

/// Subject line used for every reminder email.
pub const REMINDER_SUBJECT: &str = "Repaso: item(s) to revisit today";

/// Delivers a selected subset of items to a recipient address.
///
/// Implementations must be safe to share across sweeps; per-user failures
/// are isolated by the orchestrator, not the sender.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(&self, to: &str, items: &[Item]) -> Result<(), NotifyError>;
}

/// Render the plain-text reminder body: a numbered `title - link` list.
pub fn render_body(items: &[Item]) -> String {
    let mut body = String::from("Hi,\n\nHere's what to revisit today:\n\n");
    for (idx, item) in items.iter().enumerate() {
        if item.link.is_empty() {
            body.push_str(&format!("{}. {}\n", idx + 1, item.title));
        } else {
            body.push_str(&format!("{}. {} - {}\n", idx + 1, item.title, item.link));
        }
    }
    body.push_str("\nKeep going!\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_render_body_numbers_items() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let items = vec![
            Item::new(user, "Two Sum", "https://example.com/1", now),
            Item::new(user, "Course Schedule", "https://example.com/2", now),
        ];

        let body = render_body(&items);
        assert!(body.contains("1. Two Sum - https://example.com/1"));
        assert!(body.contains("2. Course Schedule - https://example.com/2"));
        assert!(body.ends_with("Keep going!\n"));
    }

    #[test]
    fn test_render_body_omits_empty_link() {
        let items = vec![Item::new(Uuid::new_v4(), "No link", "", Utc::now())];
        let body = render_body(&items);
        assert!(body.contains("1. No link\n"));
        assert!(!body.contains(" - \n"));
    }
}
