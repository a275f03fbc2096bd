//! The sweep engine: one guarded pass over every tracked character.
//!
//! Multiple timers and the manual trigger all call [`SweepEngine::run_sweep`];
//! a single in-flight guard turns overlapping invocations into no-ops, so
//! concurrent triggers can never double-fetch, double-notify, or race on the
//! store.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;

use crate::detect;
use crate::error::Result;
use crate::model::TrackedEntity;
use crate::notify::NotificationSink;
use crate::provider::DataProvider;
use crate::store::EntityStore;

/// Result of one sweep invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Another sweep was already in flight; this invocation did nothing.
    Skipped,
    Completed {
        polled: usize,
        notified: usize,
        failed: usize,
    },
}

pub struct SweepEngine {
    store: Arc<Mutex<EntityStore>>,
    provider: Arc<dyn DataProvider>,
    sink: Arc<dyn NotificationSink>,
    /// Fixed delay between consecutive fetches, politeness toward the source.
    pace: Duration,
    in_flight: tokio::sync::Mutex<()>,
    shutdown: Arc<AtomicBool>,
}

impl SweepEngine {
    pub fn new(
        store: Arc<Mutex<EntityStore>>,
        provider: Arc<dyn DataProvider>,
        sink: Arc<dyn NotificationSink>,
        pace: Duration,
    ) -> Self {
        Self {
            store,
            provider,
            sink,
            pace,
            in_flight: tokio::sync::Mutex::new(()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag checked between characters; setting it stops an in-flight sweep
    /// after the current character, never mid-write.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Polls every tracked character once, applying change detection and
    /// delivering notifications. Safe to call concurrently: a second caller
    /// while a sweep is in flight is a logged no-op.
    pub async fn run_sweep(&self) -> SweepOutcome {
        // The guard is released on every exit path when `_guard` drops.
        let _guard = match self.in_flight.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                log::info!("Sweep already in progress, skipping this trigger");
                return SweepOutcome::Skipped;
            }
        };

        let entities = self.store.lock().unwrap().all();
        log::info!("Sweep started: {} tracked character(s)", entities.len());

        let mut polled = 0;
        let mut notified = 0;
        let mut failed = 0;

        for (i, entity) in entities.iter().enumerate() {
            if self.shutdown.load(Ordering::Relaxed) {
                log::info!(
                    "Shutdown requested, stopping sweep after {polled} of {} character(s)",
                    entities.len()
                );
                break;
            }
            if i > 0 {
                tokio::time::sleep(self.pace).await;
            }

            polled += 1;
            match self.poll_entity(entity).await {
                Ok(true) => notified += 1,
                Ok(false) => {}
                Err(e) if e.is_persistence() => {
                    // Memory was rolled back; the operator must know the
                    // registry could not be written.
                    failed += 1;
                    log::error!(
                        "Failed to persist {} on {}: {e}; state unchanged",
                        entity.name,
                        entity.server
                    );
                }
                Err(e) => {
                    failed += 1;
                    log::warn!("Poll failed for {} on {}: {e}", entity.name, entity.server);
                }
            }
        }

        log::info!("Sweep finished: {polled} polled, {notified} notified, {failed} failed");
        SweepOutcome::Completed {
            polled,
            notified,
            failed,
        }
    }

    /// Polls one character. Returns whether a notification was produced.
    ///
    /// The refreshed record is committed to the store before any delivery
    /// attempt: a notification about state the registry never recorded must
    /// not go out. A failed delivery does not roll the record back; only the
    /// announcement was lost.
    async fn poll_entity(&self, entity: &TrackedEntity) -> Result<bool> {
        let snapshot = self.provider.fetch(&entity.server, &entity.name).await?;
        let (updated, notification) = detect::apply(entity, &snapshot, Utc::now());

        self.store.lock().unwrap().put(updated)?;

        let Some(notification) = notification else {
            return Ok(false);
        };

        if let Err(e) = self.sink.deliver(&notification).await {
            log::warn!(
                "Could not announce level-up for {} on {}: {e}",
                entity.name,
                entity.server
            );
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "sweep_tests.rs"]
mod tests;
