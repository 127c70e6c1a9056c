//! Owned record table, partitioned by tier.
//!
//! The [`RecordStore`] is the single owner of every [`Record`]. No other
//! component holds records; everything else works on clones handed out by
//! the tier manager.

use std::collections::HashMap;

use crate::record::{Record, Tier};

/// One hash map per tier, keyed by record key.
#[derive(Debug, Default)]
pub struct RecordStore {
    hot: HashMap<String, Record>,
    warm: HashMap<String, Record>,
    cold: HashMap<String, Record>,
    archive: HashMap<String, Record>,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slab(&self, tier: Tier) -> &HashMap<String, Record> {
        match tier {
            Tier::Hot => &self.hot,
            Tier::Warm => &self.warm,
            Tier::Cold => &self.cold,
            Tier::Archive => &self.archive,
        }
    }

    fn slab_mut(&mut self, tier: Tier) -> &mut HashMap<String, Record> {
        match tier {
            Tier::Hot => &mut self.hot,
            Tier::Warm => &mut self.warm,
            Tier::Cold => &mut self.cold,
            Tier::Archive => &mut self.archive,
        }
    }

    /// Insert a record into the tier named by `record.tier`.
    /// Overwrites any record already stored under the same key in that tier.
    pub fn insert(&mut self, record: Record) {
        let tier = record.tier;
        self.slab_mut(tier).insert(record.key.clone(), record);
    }

    /// Tier currently holding `key`, scanning fastest first.
    #[must_use]
    pub fn tier_of(&self, key: &str) -> Option<Tier> {
        Tier::ACCESS_ORDER
            .into_iter()
            .find(|tier| self.slab(*tier).contains_key(key))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Record> {
        for tier in Tier::ACCESS_ORDER {
            if let Some(record) = self.slab(tier).get(key) {
                return Some(record);
            }
        }
        None
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Record> {
        for tier in Tier::ACCESS_ORDER {
            if self.slab(tier).contains_key(key) {
                return self.slab_mut(tier).get_mut(key);
            }
        }
        None
    }

    /// Remove and return the record for `key` from whichever tier holds it.
    pub fn take(&mut self, key: &str) -> Option<Record> {
        for tier in Tier::ACCESS_ORDER {
            if let Some(record) = self.slab_mut(tier).remove(key) {
                return Some(record);
            }
        }
        None
    }

    /// Move a record to `target`, updating its tier field.
    /// Returns `false` if the key does not exist or is already in `target`.
    pub fn move_to(&mut self, key: &str, target: Tier) -> bool {
        let Some(current) = self.tier_of(key) else {
            return false;
        };
        if current == target {
            return false;
        }
        let Some(mut record) = self.slab_mut(current).remove(key) else {
            return false;
        };
        record.tier = target;
        crate::metrics::record_tier_move(current.as_str(), target.as_str());
        self.slab_mut(target).insert(record.key.clone(), record);
        true
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.tier_of(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hot.len() + self.warm.len() + self.cold.len() + self.archive.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn tier_len(&self, tier: Tier) -> usize {
        self.slab(tier).len()
    }

    /// Summed payload bytes held by a tier.
    #[must_use]
    pub fn tier_bytes(&self, tier: Tier) -> u64 {
        self.slab(tier).values().map(|r| r.metadata.size_bytes).sum()
    }

    /// Iterate all records, hot tier first.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.hot
            .values()
            .chain(self.warm.values())
            .chain(self.cold.values())
            .chain(self.archive.values())
    }

    /// Iterate all records mutably, hot tier first.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Record> {
        self.hot
            .values_mut()
            .chain(self.warm.values_mut())
            .chain(self.cold.values_mut())
            .chain(self.archive.values_mut())
    }

    /// Iterate the records of a single tier.
    pub fn iter_tier(&self, tier: Tier) -> impl Iterator<Item = &Record> {
        self.slab(tier).values()
    }
}
