//! Email sender -- POSTs reminders to a Resend-compatible API.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

use crate::error::NotifyError;
use crate::model::Item;
use crate::storage::EmailConfig;

use super::{render_body, NotificationSender, REMINDER_SUBJECT};

/// HTTP email sender.
///
/// Without an API key it runs in simulation mode: the rendered message is
/// logged instead of sent, and the send reports success. This mirrors local
/// development, where reminders should flow through the whole pipeline
/// without touching a provider.
pub struct EmailSender {
    api_url: String,
    api_key: Option<String>,
    from: String,
    client: Client,
}

impl EmailSender {
    /// Build a sender from the email section of the application config.
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            api_url: config.api_url.clone(),
            api_key: config.resolve_api_key(),
            from: config.from.clone(),
            client: Client::new(),
        }
    }

    fn simulate(&self, to: &str, body: &str) {
        info!(
            to,
            from = %self.from,
            subject = REMINDER_SUBJECT,
            "email simulation (no API key configured)\n{body}"
        );
    }
}

#[async_trait]
impl NotificationSender for EmailSender {
    async fn send(&self, to: &str, items: &[Item]) -> Result<(), NotifyError> {
        let body = render_body(items);

        let Some(api_key) = self.api_key.as_deref() else {
            self.simulate(to, &body);
            return Ok(());
        };

        let payload = json!({
            "from": self.from,
            "to": [to],
            "subject": REMINDER_SUBJECT,
            "text": body,
        });

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}
