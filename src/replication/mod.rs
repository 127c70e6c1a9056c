// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Replication coordinator: best-effort fan-out of changed records.
//!
//! Changed records are queued by key (latest write wins, so bursts of
//! writes coalesce into a single sync per key per cycle) and delivered to
//! every registered peer on each cycle. Delivery is fan-out, not quorum:
//! a cycle with zero peers still succeeds. A failed record stays queued
//! and is retried on the next cycle.

mod transport;

pub use transport::{LoopbackTransport, PeerTransport, TransportError};

use std::collections::{BTreeSet, HashMap, VecDeque};

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::record::{now_millis, Record, SyncState};

/// Result of one sync cycle. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    pub success: bool,
    pub records_synced: u64,
    pub errors: Vec<String>,
    pub timestamp: i64,
}

/// A [`SyncResult`] plus the per-record outcomes the facade writes back
/// into the record store. Each entry carries the record id so a key that
/// was overwritten mid-cycle is never stamped with the old outcome.
#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub result: SyncResult,
    pub synced: Vec<(String, Uuid)>,
    pub failed: Vec<(String, Uuid)>,
}

/// Point-in-time view of the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct SyncStatus {
    pub enabled: bool,
    pub queue_depth: usize,
    pub peer_count: usize,
    pub last_result: Option<SyncResult>,
}

/// Running statistics over the bounded result history.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct SyncStats {
    pub total_syncs: u64,
    pub total_records_synced: u64,
    pub total_errors: u64,
    /// Percentage of fully successful cycles (100.0 with no history)
    pub success_rate: f64,
}

/// Queues changed records and fans them out to registered peers.
pub struct ReplicationCoordinator {
    /// Pending records keyed by record key; at most one queued copy per key
    queue: HashMap<String, Record>,
    peers: BTreeSet<String>,
    history: VecDeque<SyncResult>,
    history_cap: usize,
    enabled: bool,
}

impl ReplicationCoordinator {
    #[must_use]
    pub fn new(enabled: bool, history_cap: usize) -> Self {
        Self {
            queue: HashMap::new(),
            peers: BTreeSet::new(),
            history: VecDeque::new(),
            history_cap: history_cap.max(1),
            enabled,
        }
    }

    /// Queue a record for the next cycle. Re-queuing a key before the cycle
    /// runs replaces the pending payload.
    pub fn queue(&mut self, mut record: Record) {
        record.metadata.sync_state = SyncState::Pending;
        self.queue.insert(record.key.clone(), record);
        crate::metrics::set_sync_queue_depth(self.queue.len());
    }

    /// Register a peer; takes effect on the next cycle.
    pub fn add_peer(&mut self, peer_id: &str) -> bool {
        let added = self.peers.insert(peer_id.to_string());
        crate::metrics::set_peer_count(self.peers.len());
        added
    }

    /// Remove a peer. Does not retroactively affect records already synced.
    pub fn remove_peer(&mut self, peer_id: &str) -> bool {
        let removed = self.peers.remove(peer_id);
        crate::metrics::set_peer_count(self.peers.len());
        removed
    }

    #[must_use]
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Records still awaiting sync (clones).
    #[must_use]
    pub fn pending_records(&self) -> Vec<Record> {
        self.queue.values().cloned().collect()
    }

    /// Whether a record still needs to reach the peers.
    #[must_use]
    pub fn needs_sync(record: &Record) -> bool {
        record.metadata.sync_state != SyncState::Synced
    }

    /// Run one sync cycle: deliver every queued record to every peer.
    ///
    /// Success per record requires no delivery error; with zero peers every
    /// record succeeds trivially. Failed records stay queued for retry. An
    /// empty queue returns a successful result without touching history.
    pub async fn perform_sync(&mut self, transport: &dyn PeerTransport) -> SyncOutcome {
        if self.queue.is_empty() {
            return SyncOutcome {
                result: SyncResult {
                    success: true,
                    records_synced: 0,
                    errors: Vec::new(),
                    timestamp: now_millis(),
                },
                synced: Vec::new(),
                failed: Vec::new(),
            };
        }

        let peers: Vec<String> = self.peers.iter().cloned().collect();
        let keys: Vec<String> = self.queue.keys().cloned().collect();

        let mut synced_count = 0u64;
        let mut errors = Vec::new();
        let mut synced = Vec::new();
        let mut failed = Vec::new();

        for key in keys {
            let payload = match self.queue.get_mut(&key) {
                Some(record) => {
                    record.metadata.sync_state = SyncState::Syncing;
                    record.clone()
                }
                None => continue,
            };

            let mut delivery_errors = Vec::new();
            for peer in &peers {
                if let Err(err) = transport.deliver(peer, &payload).await {
                    delivery_errors.push(format!("failed to sync '{}' to '{}': {}", key, peer, err));
                }
            }

            if delivery_errors.is_empty() {
                self.queue.remove(&key);
                synced_count += 1;
                synced.push((key, payload.id));
            } else {
                if let Some(record) = self.queue.get_mut(&key) {
                    record.metadata.sync_state = SyncState::Failed;
                }
                warn!(key = %key, errors = delivery_errors.len(), "record sync failed, will retry");
                errors.extend(delivery_errors);
                failed.push((key, payload.id));
            }
        }

        let result = SyncResult {
            success: errors.is_empty(),
            records_synced: synced_count,
            errors,
            timestamp: now_millis(),
        };

        self.history.push_back(result.clone());
        while self.history.len() > self.history_cap {
            self.history.pop_front();
        }

        debug!(
            synced = result.records_synced,
            errors = result.errors.len(),
            remaining = self.queue.len(),
            "sync cycle complete"
        );
        crate::metrics::record_sync_cycle(result.records_synced, result.errors.len());
        crate::metrics::set_sync_queue_depth(self.queue.len());

        SyncOutcome {
            result,
            synced,
            failed,
        }
    }

    #[must_use]
    pub fn status(&self) -> SyncStatus {
        SyncStatus {
            enabled: self.enabled,
            queue_depth: self.queue.len(),
            peer_count: self.peers.len(),
            last_result: self.history.back().cloned(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> SyncStats {
        let total_syncs = self.history.len() as u64;
        let total_records_synced = self.history.iter().map(|r| r.records_synced).sum();
        let total_errors = self.history.iter().map(|r| r.errors.len() as u64).sum();
        let success_rate = if self.history.is_empty() {
            100.0
        } else {
            let successes = self.history.iter().filter(|r| r.success).count();
            successes as f64 / self.history.len() as f64 * 100.0
        };

        SyncStats {
            total_syncs,
            total_records_synced,
            total_errors,
            success_rate,
        }
    }
}
