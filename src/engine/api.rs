//! Query surface over the record store.
//!
//! Queries read record snapshots without bumping access counts; only
//! [`crate::Engine::get`] counts as an access.

use super::{Engine, QueryOptions, SortField, SortOrder};
use crate::record::Record;

impl Engine {
    /// List records matching `options`: optional tier filter, sorting, and
    /// offset/limit pagination. Without a sort field the order follows tier
    /// iteration (hot first) and is not otherwise defined.
    #[must_use]
    pub fn query(&self, options: &QueryOptions) -> Vec<Record> {
        let mut records = self.tiers.read().list(options.tier);

        if let Some(field) = options.sort_by {
            match field {
                SortField::Key => records.sort_by(|a, b| a.key.cmp(&b.key)),
                SortField::CreatedAt => records.sort_by_key(|r| r.created_at),
                SortField::AccessCount => records.sort_by_key(|r| r.metadata.access_count),
                SortField::Size => records.sort_by_key(|r| r.metadata.size_bytes),
            }
            if options.sort_order == SortOrder::Desc {
                records.reverse();
            }
        }

        let offset = options.offset.min(records.len());
        let end = match options.limit {
            Some(limit) => (offset + limit).min(records.len()),
            None => records.len(),
        };
        records.drain(..offset);
        records.truncate(end - offset);
        records
    }

    /// All live keys, hot tier first.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.tiers.read().keys()
    }

    /// Number of live records across all tiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tiers.read().is_empty()
    }
}
