//! Sweep scheduling: repeating interval timers plus a manual trigger, all
//! funneling into the engine's single guarded entry point.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::sweep::SweepEngine;

/// Handle for requesting an immediate sweep from outside the scheduler.
#[derive(Clone)]
pub struct SweepHandle {
    tx: mpsc::Sender<()>,
}

impl SweepHandle {
    /// Requests a sweep now. If a request is already queued the call is a
    /// no-op; the engine's guard makes duplicates harmless anyway.
    pub fn trigger_now(&self) {
        let _ = self.tx.try_send(());
    }
}

/// One logical scheduler owning a repeating task per configured interval.
pub struct Scheduler {
    engine: Arc<SweepEngine>,
    intervals: Vec<Duration>,
    manual_tx: mpsc::Sender<()>,
    manual_rx: mpsc::Receiver<()>,
}

impl Scheduler {
    pub fn new(engine: Arc<SweepEngine>, intervals: Vec<Duration>) -> Self {
        let (manual_tx, manual_rx) = mpsc::channel(1);
        Self {
            engine,
            intervals,
            manual_tx,
            manual_rx,
        }
    }

    pub fn handle(&self) -> SweepHandle {
        SweepHandle {
            tx: self.manual_tx.clone(),
        }
    }

    /// Runs until `shutdown` fires. Performs one sweep immediately on
    /// startup, then sweeps on every interval tick and manual trigger.
    pub async fn run(mut self, shutdown: watch::Receiver<bool>) {
        self.engine.run_sweep().await;

        let mut tasks = Vec::new();
        for interval in self.intervals.clone() {
            let engine = Arc::clone(&self.engine);
            let mut shutdown = shutdown.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = tokio::time::interval(interval);
                // The first tick fires immediately; the startup sweep already
                // covered it.
                ticker.tick().await;
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            log::info!("Scheduled sweep trigger ({}s interval)", interval.as_secs());
                            engine.run_sweep().await;
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            }));
        }

        let mut shutdown = shutdown;
        loop {
            tokio::select! {
                Some(()) = self.manual_rx.recv() => {
                    log::info!("Manual sweep trigger");
                    self.engine.run_sweep().await;
                }
                _ = shutdown.changed() => break,
            }
        }

        for task in tasks {
            let _ = task.await;
        }
        log::info!("Scheduler stopped");
    }
}
