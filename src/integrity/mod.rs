// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Integrity guard: corruption detection and targeted repair.
//!
//! The [`IntegrityGuard`] recomputes checksums and sizes to detect value
//! corruption and metadata drift. Data problems never surface as errors;
//! every finding flows through a [`HealthReport`]. Checksum mismatches
//! cannot be self-healed and stay flagged in a corruption set until a
//! backup is supplied to [`IntegrityGuard::repair`].

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, warn};

use crate::record::{now_millis, payload_checksum, payload_size, Record};

/// Repair-history count above which a record is flagged as suspicious.
const FREQUENT_REPAIR_LIMIT: usize = 3;
/// Days without access after which a record is flagged as stale.
const STALE_DAYS: f64 = 365.0;
/// Access count above which usage is flagged as anomalous.
const ANOMALOUS_ACCESS_COUNT: u64 = 10_000;

/// Health of a record or of the whole system.
///
/// Escalates only: `Critical > Degraded > Healthy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Critical,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Result of one health check. Transient; produced per call, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub issues: Vec<String>,
    pub repair_actions: Vec<String>,
    pub timestamp: i64,
}

impl HealthReport {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Repair statistics for the stats surface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RepairStats {
    pub total_repairs: u64,
    pub corrupted_records: u64,
    pub records_with_history: u64,
}

/// Detects and, where possible, repairs corrupted or inconsistent records.
#[derive(Debug, Default)]
pub struct IntegrityGuard {
    /// Repair attempt timestamps per key
    repair_history: HashMap<String, Vec<i64>>,
    /// Keys with unresolved checksum mismatches
    corrupted: HashSet<String>,
}

impl IntegrityGuard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check a single record: checksum, size, timestamp sanity.
    pub fn check_health(&mut self, record: &Record) -> HealthReport {
        let mut issues = Vec::new();
        let mut repair_actions = Vec::new();
        let mut status = HealthStatus::Healthy;

        if payload_checksum(&record.value) != record.metadata.checksum {
            issues.push(format!("checksum mismatch for record {}", record.key));
            status = HealthStatus::Critical;
            repair_actions.push("restore from backup or redundant copy".to_string());
            if self.corrupted.insert(record.key.clone()) {
                warn!(key = %record.key, "corruption detected");
                crate::metrics::record_corruption();
            }
        }

        if payload_size(&record.value) != record.metadata.size_bytes {
            issues.push(format!("size mismatch for record {}", record.key));
            status = status.max(HealthStatus::Degraded);
            repair_actions.push("recalculate metadata".to_string());
        }

        if record.created_at > now_millis() {
            issues.push(format!("invalid timestamp for record {}", record.key));
            status = status.max(HealthStatus::Degraded);
            repair_actions.push("correct timestamp".to_string());
        }

        HealthReport {
            status,
            issues,
            repair_actions,
            timestamp: now_millis(),
        }
    }

    /// Attempt to repair a record in place.
    ///
    /// With a backup, the value is restored and checksum/size recomputed
    /// from it. Without one, size and timestamp problems are self-healed;
    /// checksum mismatches stay in the corruption set for external
    /// intervention. Returns `true` only if at least one issue was fixed.
    pub fn repair(&mut self, record: &mut Record, backup: Option<&Record>) -> bool {
        let report = self.check_health(record);
        if report.is_healthy() && backup.is_none() {
            return false;
        }

        self.repair_history
            .entry(record.key.clone())
            .or_default()
            .push(now_millis());

        let mut repaired = false;

        if let Some(backup) = backup {
            record.value = backup.value.clone();
            record.refresh_integrity();
            debug!(key = %record.key, "restored record from backup");
            crate::metrics::record_repair("backup_restore");
            repaired = true;
        } else {
            if payload_size(&record.value) != record.metadata.size_bytes {
                record.metadata.size_bytes = payload_size(&record.value);
                crate::metrics::record_repair("size_recalculated");
                repaired = true;
            }
            if record.created_at > now_millis() {
                record.created_at = now_millis();
                crate::metrics::record_repair("timestamp_corrected");
                repaired = true;
            }
        }

        // The corruption flag clears only once the stored checksum is
        // consistent with the value again.
        if repaired && payload_checksum(&record.value) == record.metadata.checksum {
            self.corrupted.remove(&record.key);
        }

        repaired
    }

    /// Aggregate health check across all records; worst status wins.
    pub fn scan_system(&mut self, records: &[Record]) -> HealthReport {
        let mut issues = Vec::new();
        let mut repair_actions = Vec::new();
        let mut status = HealthStatus::Healthy;

        for record in records {
            let report = self.check_health(record);
            if !report.is_healthy() {
                status = status.max(report.status);
                issues.extend(report.issues);
                repair_actions.extend(report.repair_actions);
            }
        }

        HealthReport {
            status,
            issues,
            repair_actions,
            timestamp: now_millis(),
        }
    }

    /// Check and self-repair every record; returns the number repaired.
    pub fn auto_repair_all<'a, I>(&mut self, records: I) -> u64
    where
        I: IntoIterator<Item = &'a mut Record>,
    {
        let mut repaired = 0u64;
        for record in records {
            let report = self.check_health(record);
            if !report.is_healthy() && self.repair(record, None) {
                repaired += 1;
            }
        }
        repaired
    }

    /// Heuristic scan for records likely to cause trouble. Advisory only;
    /// produces no side effects.
    #[must_use]
    pub fn predict_issues(&self, records: &[Record]) -> Vec<String> {
        let now = now_millis();
        let mut predictions = Vec::new();

        for record in records {
            if let Some(history) = self.repair_history.get(&record.key) {
                if history.len() > FREQUENT_REPAIR_LIMIT {
                    predictions.push(format!(
                        "record {} has frequent repair history",
                        record.key
                    ));
                }
            }

            if record.days_since_access(now) > STALE_DAYS {
                predictions.push(format!(
                    "record {} not accessed in over a year, may be stale",
                    record.key
                ));
            }

            if record.metadata.access_count > ANOMALOUS_ACCESS_COUNT {
                predictions.push(format!(
                    "record {} has unusually high access count",
                    record.key
                ));
            }
        }

        predictions
    }

    /// Keys currently flagged with unresolved checksum mismatches.
    #[must_use]
    pub fn corrupted_keys(&self) -> Vec<String> {
        self.corrupted.iter().cloned().collect()
    }

    #[must_use]
    pub fn stats(&self) -> RepairStats {
        RepairStats {
            total_repairs: self.repair_history.values().map(|h| h.len() as u64).sum(),
            corrupted_records: self.corrupted.len() as u64,
            records_with_history: self.repair_history.len() as u64,
        }
    }
}
