// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Tiering policy: frequency-based promotion, recency-based demotion.
//!
//! Access count drives promotion and elapsed time drives demotion, so a
//! frequently-used-but-stale record and a recently-touched-but-rare record
//! are handled by different signals. Count thresholds are checked before
//! time thresholds: an old-but-popular record stays hot even past the
//! archive age cutoff.

use serde::Deserialize;

use crate::record::Tier;

/// Placement thresholds. Immutable for the lifetime of an engine.
#[derive(Debug, Clone, Deserialize)]
pub struct TieringPolicy {
    /// Access count for promotion to HOT
    pub hot_threshold: u64,
    /// Access count for promotion to WARM
    pub warm_threshold: u64,
    /// Days since access for demotion to COLD
    pub cold_threshold_days: f64,
    /// Days since access for demotion to ARCHIVE
    pub archive_threshold_days: f64,
}

impl Default for TieringPolicy {
    fn default() -> Self {
        Self {
            hot_threshold: 100,
            warm_threshold: 10,
            cold_threshold_days: 30.0,
            archive_threshold_days: 90.0,
        }
    }
}

impl TieringPolicy {
    /// Target tier for a full-sweep reclassification. First match wins;
    /// `None` means the record stays where it is.
    #[must_use]
    pub fn target_tier(&self, access_count: u64, days_since_access: f64) -> Option<Tier> {
        if access_count >= self.hot_threshold {
            Some(Tier::Hot)
        } else if access_count >= self.warm_threshold {
            Some(Tier::Warm)
        } else if days_since_access >= self.archive_threshold_days {
            Some(Tier::Archive)
        } else if days_since_access >= self.cold_threshold_days {
            Some(Tier::Cold)
        } else {
            None
        }
    }

    /// Single-record promotion check evaluated on the read path.
    #[must_use]
    pub fn promotion_tier(&self, access_count: u64, current: Tier) -> Option<Tier> {
        if access_count >= self.hot_threshold && current != Tier::Hot {
            Some(Tier::Hot)
        } else if current == Tier::Cold && access_count >= self.warm_threshold {
            Some(Tier::Warm)
        } else {
            None
        }
    }
}
