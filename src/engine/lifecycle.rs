// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine lifecycle: worker startup and shutdown.
//!
//! Three workers drive the periodic behavior: an integrity sweep, a tier
//! optimization pass, and a replication cycle. Each runs on its own
//! interval with missed ticks skipped, so a slow sweep is never followed
//! by a burst of catch-up runs. Worker errors are logged, never
//! propagated; a failing sweep must not take the engine down.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use super::{Engine, EngineState};
use crate::integrity::IntegrityGuard;
use crate::record::SyncState;
use crate::replication::{PeerTransport, ReplicationCoordinator};
use crate::tiering::TierManager;

impl Engine {
    /// Start the background workers and mark the engine running.
    ///
    /// Idempotent: calling again while running is a no-op. Workers whose
    /// feature is disabled in the config are not started. The engine is
    /// usable without `initialize`; only the periodic sweeps need it.
    pub fn initialize(&self) {
        let mut workers = self.workers.lock();
        if !workers.is_empty() {
            debug!("initialize called on a running engine");
            return;
        }

        if self.config.enable_auto_repair {
            workers.push(tokio::spawn(integrity_worker(
                Arc::clone(&self.tiers),
                Arc::clone(&self.integrity),
                self.config.integrity_sweep_secs,
            )));
        }

        workers.push(tokio::spawn(optimize_worker(
            Arc::clone(&self.tiers),
            self.config.tier_optimize_secs,
        )));

        if self.config.enable_sync && self.config.sync_interval_ms > 0 {
            workers.push(tokio::spawn(sync_worker(
                Arc::clone(&self.tiers),
                Arc::clone(&self.replication),
                Arc::clone(&self.transport),
                self.config.sync_interval_ms,
            )));
        }

        let count = workers.len();
        drop(workers);

        let _ = self.state_tx.send(EngineState::Running);
        info!(workers = count, "engine initialized");
    }

    /// Stop the workers and mark the engine stopped.
    ///
    /// Safe to call at any point, including before `initialize` and more
    /// than once. Records stay in memory; only the workers stop.
    pub async fn shutdown(&self) {
        let _ = self.state_tx.send(EngineState::ShuttingDown);

        let handles: Vec<_> = self.workers.lock().drain(..).collect();
        for handle in handles {
            handle.abort();
            // Aborted tasks resolve with a cancellation error; either way
            // the worker is gone.
            let _ = handle.await;
        }

        let _ = self.state_tx.send(EngineState::Stopped);
        info!("engine stopped");
    }
}

async fn integrity_worker(
    tiers: Arc<RwLock<TierManager>>,
    integrity: Arc<RwLock<IntegrityGuard>>,
    sweep_secs: u64,
) {
    let mut timer = interval(Duration::from_secs(sweep_secs.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer.tick().await; // first tick fires immediately

    loop {
        timer.tick().await;
        let repaired = {
            let mut tiers = tiers.write();
            let mut integrity = integrity.write();
            integrity.auto_repair_all(tiers.iter_mut())
        };
        if repaired > 0 {
            info!(repaired, "integrity sweep repaired records");
        }
    }
}

async fn optimize_worker(tiers: Arc<RwLock<TierManager>>, optimize_secs: u64) {
    let mut timer = interval(Duration::from_secs(optimize_secs.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer.tick().await;

    loop {
        timer.tick().await;
        let moved = tiers.write().optimize_tiers();
        if moved > 0 {
            debug!(moved, "periodic tier optimization");
        }
    }
}

async fn sync_worker(
    tiers: Arc<RwLock<TierManager>>,
    replication: Arc<tokio::sync::Mutex<ReplicationCoordinator>>,
    transport: Arc<dyn PeerTransport>,
    interval_ms: u64,
) {
    let mut timer = interval(Duration::from_millis(interval_ms.max(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer.tick().await;

    loop {
        timer.tick().await;

        let outcome = {
            let mut replication = replication.lock().await;
            replication.perform_sync(transport.as_ref()).await
        };

        let mut tiers = tiers.write();
        for (key, id) in &outcome.synced {
            tiers.set_sync_state(key, *id, SyncState::Synced);
        }
        for (key, id) in &outcome.failed {
            tiers.set_sync_state(key, *id, SyncState::Failed);
        }
    }
}
