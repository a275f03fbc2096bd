//! Notification payloads and delivery sinks.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{Result, TrackerError};
use crate::model::CharacterAttributes;

/// Payload emitted when a tracked character's level strictly increases.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelUpNotification {
    /// Opaque delivery handle from the character's registration.
    pub target: String,
    pub name: String,
    pub server: String,
    pub old_level: u32,
    pub new_level: u32,
    pub attributes: CharacterAttributes,
}

impl LevelUpNotification {
    /// Human-readable announcement line.
    pub fn message(&self) -> String {
        let mut line = format!(
            "\u{1F525} **{}** leveled up! **{} \u{2192} {}**",
            self.name, self.old_level, self.new_level
        );
        if let (Some(race), Some(class)) = (
            self.attributes.race.as_deref(),
            self.attributes.character_class.as_deref(),
        ) {
            line.push_str(&format!(" ({race} {class}, {})", self.server));
        }
        line
    }
}

/// Delivery target for level-up events. Invoked at most once per detected
/// increase per sweep; retry policy belongs to the implementation, not the
/// sweep engine.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &LevelUpNotification) -> Result<()>;
}

/// Posts notifications as JSON to the webhook URL carried in the payload's
/// `target` (Discord-compatible body shape).
pub struct WebhookSink {
    client: reqwest::Client,
}

impl WebhookSink {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, notification: &LevelUpNotification) -> Result<()> {
        log::debug!(
            "Delivering level-up for {} on {} to {}",
            notification.name,
            notification.server,
            notification.target
        );

        let body = serde_json::json!({
            "content": notification.message(),
            "armory_watch": notification,
        });

        let response = self
            .client
            .post(&notification.target)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TrackerError::Delivery(format!(
                "webhook returned {status}: {detail}"
            )));
        }

        log::info!(
            "Announced {} on {}: {} -> {}",
            notification.name,
            notification.server,
            notification.old_level,
            notification.new_level
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "notify_tests.rs"]
mod tests;
