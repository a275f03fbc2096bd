//! Core data model: tracked characters and provider snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derives the registry key for a server+name pair.
///
/// Keys are lowercase so `!track Thrall Dreamscythe` and
/// `!track thrall dreamscythe` address the same record.
pub fn entity_key(server: &str, name: &str) -> String {
    format!("{}-{}", server.to_lowercase(), name.to_lowercase())
}

/// Secondary character fields, refreshed on every successful poll.
///
/// All fields are optional: the scraping source only exposes some of them and
/// older registry files may predate newer fields entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(default, rename = "class", skip_serializing_if = "Option::is_none")]
    pub character_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// One tracked character (server+name pair) with its last-known state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// Registry primary key, see [`entity_key`].
    pub key: String,
    pub server: String,
    pub name: String,
    /// Last confirmed level. Always reflects the latest successful fetch,
    /// including source-side corrections downward; only a strict increase
    /// produces a notification.
    pub last_level: u32,
    #[serde(default)]
    pub attributes: CharacterAttributes,
    /// Timestamp of the most recent successful poll.
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,
    /// Opaque delivery handle (webhook URL) supplied at registration.
    pub notify_target: String,
}

impl TrackedEntity {
    /// Builds a fresh record from a registration-time snapshot.
    pub fn new(server: &str, name: &str, snapshot: &Snapshot, notify_target: String) -> Self {
        let server = server.to_lowercase();
        let name = name.to_lowercase();
        Self {
            key: entity_key(&server, &name),
            server,
            name,
            last_level: snapshot.level,
            attributes: snapshot.attributes.clone(),
            last_checked_at: Some(Utc::now()),
            notify_target,
        }
    }
}

/// A data provider's fresh read of one character. Transient, never persisted
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub level: u32,
    pub attributes: CharacterAttributes,
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
