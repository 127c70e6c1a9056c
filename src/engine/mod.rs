// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Engine facade: the single entry point for embedding applications.
//!
//! The [`Engine`] composes the tier manager, integrity guard, and
//! replication coordinator behind one API and owns the background workers
//! that drive periodic sweeps. Component locks are never held across an
//! await point; replication state lives behind an async mutex because its
//! sync cycle awaits the peer transport.
//!
//! # Example
//!
//! ```
//! use tier_engine::{Engine, EngineConfig, Tier};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = Engine::new(EngineConfig::default());
//! engine.initialize();
//!
//! engine.set("user.1", json!({"name": "A"}), None).await.unwrap();
//! assert_eq!(engine.get("user.1"), Some(json!({"name": "A"})));
//!
//! engine.shutdown().await;
//! # }
//! ```

mod api;
mod lifecycle;
mod types;

pub use types::{EngineState, EngineStats, QueryOptions, SortField, SortOrder};

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::integrity::{HealthReport, IntegrityGuard};
use crate::record::{Record, SyncState, Tier};
use crate::replication::{
    LoopbackTransport, PeerTransport, ReplicationCoordinator, SyncResult, SyncStatus,
};
use crate::tiering::{StoreError, TierManager};

/// Tiered data-placement engine.
///
/// Cheap to share: hand out `Arc<Engine>` clones to tasks that need access.
pub struct Engine {
    config: EngineConfig,
    tiers: Arc<RwLock<TierManager>>,
    integrity: Arc<RwLock<IntegrityGuard>>,
    replication: Arc<tokio::sync::Mutex<ReplicationCoordinator>>,
    transport: Arc<dyn PeerTransport>,
    state_tx: watch::Sender<EngineState>,
    /// Held so the state channel stays open even with no outside observers
    state_rx: watch::Receiver<EngineState>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Build an engine with the default loopback transport.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_transport(config, Arc::new(LoopbackTransport))
    }

    /// Build an engine that replicates through `transport`.
    #[must_use]
    pub fn with_transport(config: EngineConfig, transport: Arc<dyn PeerTransport>) -> Self {
        let tiers = TierManager::new(config.tiering_policy(), config.max_hot_bytes);
        let replication =
            ReplicationCoordinator::new(config.enable_sync, config.sync_history_cap);
        let (state_tx, state_rx) = watch::channel(EngineState::Created);

        Self {
            config,
            tiers: Arc::new(RwLock::new(tiers)),
            integrity: Arc::new(RwLock::new(IntegrityGuard::new())),
            replication: Arc::new(tokio::sync::Mutex::new(replication)),
            transport,
            state_tx,
            state_rx,
            workers: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Store a value under `key`, replacing any previous record.
    ///
    /// The record starts in `tier` (HOT when `None`) with fresh access
    /// bookkeeping. When replication is enabled the new record is queued
    /// for the next sync cycle.
    #[tracing::instrument(skip(self, value))]
    pub async fn set(
        &self,
        key: &str,
        value: Value,
        tier: Option<Tier>,
    ) -> Result<Record, StoreError> {
        let start = std::time::Instant::now();
        let record = match self.tiers.write().set(key, value, tier.unwrap_or(Tier::Hot)) {
            Ok(record) => record,
            Err(err) => {
                crate::metrics::record_operation("set", "error");
                return Err(err);
            }
        };

        if self.config.enable_sync {
            self.replication.lock().await.queue(record.clone());
        }

        debug!(key, tier = %record.tier, "record stored");
        crate::metrics::record_operation("set", "success");
        crate::metrics::record_latency("set", start.elapsed());
        Ok(record)
    }

    /// Fetch the value for `key`.
    ///
    /// Bumps access bookkeeping and may promote the record. With auto
    /// repair enabled, a corrupted or inconsistent record is checked and
    /// self-healed on the way out; a value that cannot be verified is still
    /// returned, flagged through [`Engine::health_check`].
    #[tracing::instrument(skip(self))]
    pub fn get(&self, key: &str) -> Option<Value> {
        let record = self.tiers.write().get(key);
        let Some(record) = record else {
            crate::metrics::record_operation("get", "miss");
            return None;
        };

        if !self.config.enable_auto_repair {
            crate::metrics::record_operation("get", "hit");
            return Some(record.value);
        }

        let mut integrity = self.integrity.write();
        let report = integrity.check_health(&record);
        if report.is_healthy() {
            crate::metrics::record_operation("get", "hit");
            return Some(record.value);
        }

        let mut repaired = record;
        if integrity.repair(&mut repaired, None) {
            drop(integrity);
            self.tiers.write().replace(repaired.clone());
            debug!(key, "record repaired on read");
        } else {
            warn!(key, issues = report.issues.len(), "unrepairable record served");
        }

        crate::metrics::record_operation("get", "hit");
        Some(repaired.value)
    }

    /// Remove the record for `key`. Returns `false` if it was not live.
    /// Already-queued replication of the key is not recalled.
    #[tracing::instrument(skip(self))]
    pub fn delete(&self, key: &str) -> bool {
        let deleted = self.tiers.write().delete(key);
        let status = if deleted { "success" } else { "miss" };
        crate::metrics::record_operation("delete", status);
        deleted
    }

    /// Check every record and report the worst status found.
    pub fn health_check(&self) -> HealthReport {
        let records = self.tiers.read().list(None);
        self.integrity.write().scan_system(&records)
    }

    /// Heuristic predictions of records likely to cause trouble.
    #[must_use]
    pub fn predict_issues(&self) -> Vec<String> {
        let records = self.tiers.read().list(None);
        self.integrity.read().predict_issues(&records)
    }

    /// Sweep all records once, self-healing what can be healed.
    /// Returns the number of records repaired.
    pub fn repair_sweep(&self) -> u64 {
        let mut tiers = self.tiers.write();
        let mut integrity = self.integrity.write();
        integrity.auto_repair_all(tiers.iter_mut())
    }

    /// Run one replication cycle now, regardless of the worker interval.
    #[tracing::instrument(skip(self))]
    pub async fn sync(&self) -> SyncResult {
        let start = std::time::Instant::now();
        let outcome = {
            let mut replication = self.replication.lock().await;
            replication.perform_sync(self.transport.as_ref()).await
        };

        // Write terminal states back into the live records. The id check
        // skips any key overwritten while the cycle ran.
        {
            let mut tiers = self.tiers.write();
            for (key, id) in &outcome.synced {
                tiers.set_sync_state(key, *id, SyncState::Synced);
            }
            for (key, id) in &outcome.failed {
                tiers.set_sync_state(key, *id, SyncState::Failed);
            }
        }

        if !outcome.result.success {
            warn!(errors = outcome.result.errors.len(), "sync cycle had errors");
        }
        crate::metrics::record_latency("sync", start.elapsed());
        outcome.result
    }

    /// Register a replica peer. Returns `false` if already registered.
    pub async fn add_peer(&self, peer_id: &str) -> bool {
        let added = self.replication.lock().await.add_peer(peer_id);
        if added {
            info!(peer_id, "peer registered");
        }
        added
    }

    /// Remove a replica peer. Returns `false` if it was not registered.
    pub async fn remove_peer(&self, peer_id: &str) -> bool {
        let removed = self.replication.lock().await.remove_peer(peer_id);
        if removed {
            info!(peer_id, "peer removed");
        }
        removed
    }

    /// Reclassify every record and enforce HOT capacity.
    /// Returns the number of records moved.
    #[tracing::instrument(skip(self))]
    pub fn optimize_tiers(&self) -> u64 {
        let moved = self.tiers.write().optimize_tiers();
        crate::metrics::record_operation("optimize", "success");
        moved
    }

    /// Records still awaiting replication.
    pub async fn pending_records(&self) -> Vec<Record> {
        self.replication.lock().await.pending_records()
    }

    pub async fn sync_status(&self) -> SyncStatus {
        self.replication.lock().await.status()
    }

    /// Aggregate statistics across storage, replication, and repair.
    pub async fn stats(&self) -> EngineStats {
        let storage = self.tiers.read().stats();
        let sync = self.replication.lock().await.stats();
        let repair = self.integrity.read().stats();

        for (tier, stats) in [
            (Tier::Hot, storage.hot),
            (Tier::Warm, storage.warm),
            (Tier::Cold, storage.cold),
            (Tier::Archive, storage.archive),
        ] {
            crate::metrics::set_tier_records(tier.as_str(), stats.count);
            crate::metrics::set_tier_bytes(tier.as_str(), stats.bytes);
        }

        EngineStats {
            storage,
            sync,
            repair,
        }
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state_rx.borrow()
    }

    /// Watch for lifecycle transitions.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<EngineState> {
        self.state_rx.clone()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == EngineState::Running
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .field("records", &self.tiers.read().len())
            .finish_non_exhaustive()
    }
}
