//! Change detection: decides what a fresh snapshot means for a tracked
//! character.
//!
//! Every successful poll refreshes the whole record; a notification is
//! produced only for a strict level increase. The two effects are independent:
//! a level that comes back equal or lower still becomes the stored truth.

use chrono::{DateTime, Utc};

use crate::model::{Snapshot, TrackedEntity};
use crate::notify::LevelUpNotification;

/// Applies a snapshot to a tracked character.
///
/// Returns the fully refreshed record and, iff the fetched level strictly
/// exceeds the stored one, the notification payload to deliver after the
/// record has been durably committed.
pub fn apply(
    entity: &TrackedEntity,
    snapshot: &Snapshot,
    now: DateTime<Utc>,
) -> (TrackedEntity, Option<LevelUpNotification>) {
    let mut updated = entity.clone();
    updated.attributes = snapshot.attributes.clone();
    updated.last_checked_at = Some(now);
    updated.last_level = snapshot.level;

    let notification = if snapshot.level > entity.last_level {
        Some(LevelUpNotification {
            target: entity.notify_target.clone(),
            name: entity.name.clone(),
            server: entity.server.clone(),
            old_level: entity.last_level,
            new_level: snapshot.level,
            attributes: snapshot.attributes.clone(),
        })
    } else {
        None
    };

    (updated, notification)
}

#[cfg(test)]
#[path = "detect_tests.rs"]
mod tests;
