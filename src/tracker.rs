//! Registration and query surface over the character registry.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::Result;
use crate::model::TrackedEntity;
use crate::provider::DataProvider;
use crate::store::EntityStore;

/// Registers and queries tracked characters. Registration performs one
/// immediate fetch before persisting, so a misspelled name or server is
/// rejected instead of silently stored.
pub struct Tracker {
    store: Arc<Mutex<EntityStore>>,
    provider: Arc<dyn DataProvider>,
}

impl Tracker {
    pub fn new(store: Arc<Mutex<EntityStore>>, provider: Arc<dyn DataProvider>) -> Self {
        Self { store, provider }
    }

    /// Starts tracking a character. Re-registering an existing server+name
    /// pair replaces the whole record, including the notify target.
    pub async fn track(
        &self,
        server: &str,
        name: &str,
        notify_target: &str,
    ) -> Result<TrackedEntity> {
        let snapshot = self.provider.fetch(server, name).await?;
        let entity = TrackedEntity::new(server, name, &snapshot, notify_target.to_string());

        self.store.lock().unwrap().put(entity.clone())?;

        log::info!(
            "Now tracking {} on {} (level {})",
            entity.name,
            entity.server,
            entity.last_level
        );
        Ok(entity)
    }

    /// Registers a batch of `(name, server)` pairs against one notify target,
    /// pacing the registration fetches like a sweep. Returns the number of
    /// successes; failures are logged and skipped.
    pub async fn batch_track(
        &self,
        pairs: &[(String, String)],
        notify_target: &str,
        pace: Duration,
    ) -> usize {
        let mut tracked = 0;
        for (i, (name, server)) in pairs.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(pace).await;
            }
            match self.track(server, name, notify_target).await {
                Ok(_) => tracked += 1,
                Err(e) => log::warn!("Could not track {name} on {server}: {e}"),
            }
        }
        tracked
    }

    /// All tracked characters in key order.
    pub fn list_tracked(&self) -> Vec<TrackedEntity> {
        self.store.lock().unwrap().all()
    }

    /// Looks a character up by name, case-insensitively, across all servers.
    /// With the same name on several servers, the first match in key order
    /// wins.
    pub fn get_tracked(&self, name: &str) -> Option<TrackedEntity> {
        self.store
            .lock()
            .unwrap()
            .all()
            .into_iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
