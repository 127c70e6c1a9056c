// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics instrumentation for tier-engine.
//!
//! Uses the `metrics` crate for backend-agnostic metrics collection.
//! The embedding process is responsible for choosing the exporter
//! (Prometheus, OTEL, etc.)
//!
//! # Metric Naming Convention
//! - `tier_engine_` prefix for all metrics
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//! - `_bytes` suffix for size histograms/gauges
//!
//! # Labels
//! - `tier`: hot, warm, cold, archive
//! - `operation`: set, get, delete, optimize, sync, repair
//! - `status`: hit, miss, success, error

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record an engine operation outcome
pub fn record_operation(operation: &str, status: &str) {
    counter!(
        "tier_engine_operations_total",
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record operation latency
pub fn record_latency(operation: &str, duration: Duration) {
    histogram!(
        "tier_engine_operation_seconds",
        "operation" => operation.to_string()
    )
    .record(duration.as_secs_f64());
}

/// Record a tier move (promotion or demotion)
pub fn record_tier_move(from: &str, to: &str) {
    counter!(
        "tier_engine_tier_moves_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// Set current record count for a tier
pub fn set_tier_records(tier: &str, count: usize) {
    gauge!(
        "tier_engine_tier_records",
        "tier" => tier.to_string()
    )
    .set(count as f64);
}

/// Set current payload bytes held by a tier
pub fn set_tier_bytes(tier: &str, bytes: u64) {
    gauge!(
        "tier_engine_tier_bytes",
        "tier" => tier.to_string()
    )
    .set(bytes as f64);
}

/// Record a detected corruption (checksum mismatch). The affected key is
/// logged, not labeled; labels stay bounded.
pub fn record_corruption() {
    counter!("tier_engine_corruption_detected_total").increment(1);
}

/// Record a completed repair
pub fn record_repair(kind: &str) {
    counter!(
        "tier_engine_repairs_total",
        "kind" => kind.to_string()
    )
    .increment(1);
}

/// Record one replication cycle
pub fn record_sync_cycle(synced: u64, errors: usize) {
    counter!("tier_engine_sync_cycles_total").increment(1);
    counter!("tier_engine_records_synced_total").increment(synced);
    counter!("tier_engine_sync_errors_total").increment(errors as u64);
}

/// Set current replication queue depth
pub fn set_sync_queue_depth(depth: usize) {
    gauge!("tier_engine_sync_queue_depth").set(depth as f64);
}

/// Set registered peer count
pub fn set_peer_count(count: usize) {
    gauge!("tier_engine_sync_peers").set(count as f64);
}
