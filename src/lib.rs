// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! # tier-engine
//!
//! An embeddable tiered data-placement engine. Records live in one of four
//! in-memory tiers (HOT, WARM, COLD, ARCHIVE) and migrate between them
//! based on observed access patterns: frequently read records rise toward
//! HOT, idle records sink toward ARCHIVE, and the HOT tier is kept under a
//! configurable byte budget by demoting its least recently used records.
//!
//! ## Architecture
//!
//! - [`TierManager`] owns every record and implements placement: read-path
//!   promotion plus the full-sweep reclassification in
//!   [`TierManager::optimize_tiers`].
//! - [`IntegrityGuard`] verifies checksums, sizes, and timestamps,
//!   self-heals what it can, and flags checksum corruption it cannot.
//! - [`ReplicationCoordinator`] queues changed records (latest write wins
//!   per key) and fans them out to registered peers through a
//!   [`PeerTransport`].
//! - [`Engine`] composes the three behind one facade and runs the
//!   background workers that drive periodic sweeps.
//!
//! ## Quick start
//!
//! ```
//! use tier_engine::{Engine, EngineConfig, QueryOptions, Tier};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let engine = Engine::new(EngineConfig::default());
//! engine.initialize();
//!
//! engine.set("user.1", json!({"name": "A"}), None).await.unwrap();
//! engine.set("log.1", json!({"msg": "old"}), Some(Tier::Cold)).await.unwrap();
//!
//! assert_eq!(engine.get("user.1"), Some(json!({"name": "A"})));
//! assert_eq!(engine.query(&QueryOptions::default()).len(), 2);
//!
//! let report = engine.health_check();
//! assert!(report.is_healthy());
//!
//! engine.shutdown().await;
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod integrity;
pub mod metrics;
pub mod record;
pub mod replication;
pub mod tiering;

pub use config::EngineConfig;
pub use engine::{Engine, EngineState, EngineStats, QueryOptions, SortField, SortOrder};
pub use integrity::{HealthReport, HealthStatus, IntegrityGuard, RepairStats};
pub use record::{Record, RecordMetadata, SyncState, Tier};
pub use replication::{
    LoopbackTransport, PeerTransport, ReplicationCoordinator, SyncResult, SyncStats, SyncStatus,
    TransportError,
};
pub use tiering::{StorageStats, StoreError, TierManager, TierStats, TieringPolicy};
