// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Tier manager: record placement across HOT/WARM/COLD/ARCHIVE.
//!
//! The [`TierManager`] owns the [`RecordStore`] and implements placement
//! policy: single-record promotion on the read path and the full-sweep
//! reclassification in [`TierManager::optimize_tiers`], including HOT-tier
//! capacity enforcement.
//!
//! # Example
//!
//! ```
//! use tier_engine::{TierManager, TieringPolicy, Tier};
//! use serde_json::json;
//!
//! let mut tiers = TierManager::new(TieringPolicy::default(), 100 * 1024 * 1024);
//!
//! tiers.set("user.1", json!({"name": "A"}), Tier::Hot).unwrap();
//! let record = tiers.get("user.1").unwrap();
//! assert_eq!(record.metadata.access_count, 1);
//! ```

mod policy;
mod store;

pub use policy::TieringPolicy;
pub use store::RecordStore;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::record::{now_millis, Record, SyncState, Tier};

/// Fraction of `max_hot_bytes` the HOT tier is drained to once it
/// exceeds the limit.
const HOT_DRAIN_RATIO: f64 = 0.9;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid key: key must be a non-empty string")]
    InvalidKey,
}

/// Count and summed payload bytes for one tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub count: usize,
    pub bytes: u64,
}

/// Per-tier counts/sizes plus totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    pub hot: TierStats,
    pub warm: TierStats,
    pub cold: TierStats,
    pub archive: TierStats,
    pub total: TierStats,
}

/// Owns all records and decides which tier each record lives in.
#[derive(Debug)]
pub struct TierManager {
    store: RecordStore,
    policy: TieringPolicy,
    max_hot_bytes: u64,
}

impl TierManager {
    #[must_use]
    pub fn new(policy: TieringPolicy, max_hot_bytes: u64) -> Self {
        Self {
            store: RecordStore::new(),
            policy,
            max_hot_bytes,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &TieringPolicy {
        &self.policy
    }

    /// Create a fresh record for `key` and place it in `tier`.
    ///
    /// Any existing record for the key is dropped from its current tier
    /// first, so at most one live record exists per key. Fails only on an
    /// empty key.
    pub fn set(&mut self, key: &str, value: Value, tier: Tier) -> Result<Record, StoreError> {
        if key.trim().is_empty() {
            return Err(StoreError::InvalidKey);
        }

        self.store.take(key);
        let record = Record::new(key.to_string(), value, tier);
        self.store.insert(record.clone());
        Ok(record)
    }

    /// Look up `key`, scanning tiers fastest first.
    ///
    /// On hit, bumps access bookkeeping and evaluates a single-record
    /// promotion check. Returns a clone of the (possibly promoted) record;
    /// `None` on miss is not an error.
    pub fn get(&mut self, key: &str) -> Option<Record> {
        let (access_count, current) = {
            let record = self.store.get_mut(key)?;
            record.touch();
            (record.metadata.access_count, record.tier)
        };

        if let Some(target) = self.policy.promotion_tier(access_count, current) {
            debug!(key, from = %current, to = %target, access_count, "promoting record");
            self.store.move_to(key, target);
        }

        self.store.get(key).cloned()
    }

    /// Remove the record for `key` from whichever tier holds it.
    pub fn delete(&mut self, key: &str) -> bool {
        self.store.take(key).is_some()
    }

    /// All records in one tier, or all tiers concatenated (hot first).
    #[must_use]
    pub fn list(&self, tier: Option<Tier>) -> Vec<Record> {
        match tier {
            Some(tier) => self.store.iter_tier(tier).cloned().collect(),
            None => self.store.iter().cloned().collect(),
        }
    }

    /// All live keys, hot tier first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.store.iter().map(|r| r.key.clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Replace a stored record with `record` (matched by key), e.g. after a
    /// repair corrected its value or metadata. The record keeps the tier
    /// named by `record.tier`. Returns `false` if the key is not live.
    pub fn replace(&mut self, record: Record) -> bool {
        if self.store.take(&record.key).is_none() {
            return false;
        }
        self.store.insert(record);
        true
    }

    /// Update the replication state of a live record without touching
    /// access bookkeeping. Applies only while `id` still names the live
    /// record; a key overwritten since the state was decided is left alone.
    pub fn set_sync_state(&mut self, key: &str, id: Uuid, state: SyncState) -> bool {
        match self.store.get_mut(key) {
            Some(record) if record.id == id => {
                record.metadata.sync_state = state;
                true
            }
            _ => false,
        }
    }

    /// Mutable sweep access for the integrity guard.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.store.iter_mut()
    }

    /// Full-sweep reclassification followed by HOT capacity enforcement.
    ///
    /// Returns the number of records moved, including capacity-driven
    /// demotions.
    pub fn optimize_tiers(&mut self) -> u64 {
        self.optimize_tiers_at(now_millis())
    }

    pub(crate) fn optimize_tiers_at(&mut self, now_ms: i64) -> u64 {
        let mut moved = 0u64;

        let placements: Vec<(String, Tier)> = self
            .store
            .iter()
            .filter_map(|record| {
                let days = record.days_since_access(now_ms);
                let target = self.policy.target_tier(record.metadata.access_count, days)?;
                (target != record.tier).then(|| (record.key.clone(), target))
            })
            .collect();

        for (key, target) in placements {
            if self.store.move_to(&key, target) {
                moved += 1;
            }
        }

        moved += self.enforce_hot_capacity();

        if moved > 0 {
            debug!(moved, "tier optimization moved records");
        }
        moved
    }

    /// Demote least-recently-accessed HOT records to WARM until the HOT
    /// tier is at or below `HOT_DRAIN_RATIO * max_hot_bytes`.
    fn enforce_hot_capacity(&mut self) -> u64 {
        let mut hot_bytes = self.store.tier_bytes(Tier::Hot);
        if hot_bytes <= self.max_hot_bytes {
            return 0;
        }

        let mut candidates: Vec<(String, i64, u64)> = self
            .store
            .iter_tier(Tier::Hot)
            .map(|r| (r.key.clone(), r.metadata.last_accessed_at, r.metadata.size_bytes))
            .collect();
        candidates.sort_by_key(|(_, last_accessed_at, _)| *last_accessed_at);

        let floor = (self.max_hot_bytes as f64 * HOT_DRAIN_RATIO) as u64;
        let mut demoted = 0u64;
        for (key, _, size) in candidates {
            if hot_bytes <= floor {
                break;
            }
            if self.store.move_to(&key, Tier::Warm) {
                hot_bytes = hot_bytes.saturating_sub(size);
                demoted += 1;
            }
        }

        if demoted > 0 {
            debug!(demoted, hot_bytes, "enforced HOT tier capacity");
        }
        demoted
    }

    /// Per-tier counts and sizes.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        let tier_stats = |tier: Tier| TierStats {
            count: self.store.tier_len(tier),
            bytes: self.store.tier_bytes(tier),
        };

        let hot = tier_stats(Tier::Hot);
        let warm = tier_stats(Tier::Warm);
        let cold = tier_stats(Tier::Cold);
        let archive = tier_stats(Tier::Archive);

        StorageStats {
            hot,
            warm,
            cold,
            archive,
            total: TierStats {
                count: hot.count + warm.count + cold.count + archive.count,
                bytes: hot.bytes + warm.bytes + cold.bytes + archive.bytes,
            },
        }
    }
}
