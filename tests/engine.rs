//! End-to-end tests against the engine facade.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tier_engine::{
    Engine, EngineConfig, EngineState, LoopbackTransport, PeerTransport, QueryOptions, Record,
    ReplicationCoordinator, SortField, SortOrder, SyncState, Tier, TierManager, TieringPolicy,
    TransportError,
};

fn quiet_engine() -> Engine {
    Engine::new(EngineConfig {
        enable_sync: false,
        enable_auto_repair: false,
        ..Default::default()
    })
}

/// Transport that counts deliveries and optionally fails every one.
#[derive(Default)]
struct CountingTransport {
    deliveries: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl PeerTransport for CountingTransport {
    async fn deliver(&self, peer_id: &str, _record: &Record) -> Result<(), TransportError> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(TransportError::Unreachable {
                peer: peer_id.to_string(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn test_set_get_roundtrip() {
    let engine = quiet_engine();

    engine.set("user.1", json!({"name": "A"}), None).await.unwrap();
    assert_eq!(engine.get("user.1"), Some(json!({"name": "A"})));
    assert_eq!(engine.get("missing"), None);
}

#[tokio::test]
async fn test_set_defaults_to_hot_tier() {
    let engine = quiet_engine();

    let record = engine.set("k", json!(1), None).await.unwrap();
    assert_eq!(record.tier, Tier::Hot);

    let record = engine.set("k2", json!(2), Some(Tier::Archive)).await.unwrap();
    assert_eq!(record.tier, Tier::Archive);
}

#[tokio::test]
async fn test_set_rejects_empty_key() {
    let engine = quiet_engine();
    assert!(engine.set("", json!({}), None).await.is_err());
    assert!(engine.set("  ", json!({}), None).await.is_err());
    assert!(engine.is_empty());
}

#[tokio::test]
async fn test_overwrite_keeps_one_record() {
    let engine = quiet_engine();

    engine.set("u1", json!({"name": "A"}), Some(Tier::Cold)).await.unwrap();
    engine.set("u1", json!({"name": "B"}), None).await.unwrap();

    assert_eq!(engine.len(), 1);
    assert_eq!(engine.get("u1"), Some(json!({"name": "B"})));
    let cold = engine.query(&QueryOptions {
        tier: Some(Tier::Cold),
        ..Default::default()
    });
    assert!(cold.is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();

    assert!(engine.delete("k"));
    assert!(!engine.delete("k"));
    assert_eq!(engine.get("k"), None);
}

#[tokio::test]
async fn test_access_count_monotonic() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();

    for _ in 0..4 {
        engine.get("k");
    }

    let records = engine.query(&QueryOptions::default());
    assert_eq!(records[0].metadata.access_count, 4);
}

#[tokio::test]
async fn test_read_path_promotion() {
    let engine = Engine::new(EngineConfig {
        hot_threshold: 3,
        warm_threshold: 2,
        enable_sync: false,
        ..Default::default()
    });

    engine.set("k", json!({}), Some(Tier::Cold)).await.unwrap();
    for _ in 0..3 {
        engine.get("k");
    }

    let hot = engine.query(&QueryOptions {
        tier: Some(Tier::Hot),
        ..Default::default()
    });
    assert_eq!(hot.len(), 1);
    assert_eq!(hot[0].key, "k");
}

#[tokio::test]
async fn test_query_sorting_and_pagination() {
    let engine = quiet_engine();
    for key in ["b", "d", "a", "c"] {
        engine.set(key, json!({"k": key}), None).await.unwrap();
    }

    let sorted = engine.query(&QueryOptions {
        sort_by: Some(SortField::Key),
        ..Default::default()
    });
    let keys: Vec<_> = sorted.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["a", "b", "c", "d"]);

    let page = engine.query(&QueryOptions {
        sort_by: Some(SortField::Key),
        sort_order: SortOrder::Desc,
        offset: 1,
        limit: Some(2),
        ..Default::default()
    });
    let keys: Vec<_> = page.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(keys, ["c", "b"]);
}

#[tokio::test]
async fn test_query_by_access_count() {
    let engine = quiet_engine();
    engine.set("cold", json!(1), None).await.unwrap();
    engine.set("popular", json!(2), None).await.unwrap();
    for _ in 0..5 {
        engine.get("popular");
    }

    let ranked = engine.query(&QueryOptions {
        sort_by: Some(SortField::AccessCount),
        sort_order: SortOrder::Desc,
        ..Default::default()
    });
    assert_eq!(ranked[0].key, "popular");
}

#[tokio::test]
async fn test_query_offset_past_end() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();

    let result = engine.query(&QueryOptions {
        offset: 10,
        ..Default::default()
    });
    assert!(result.is_empty());
}

#[tokio::test]
async fn test_health_check_clean_engine() {
    let engine = quiet_engine();
    engine.set("a", json!({"v": 1}), None).await.unwrap();
    engine.set("b", json!({"v": 2}), Some(Tier::Cold)).await.unwrap();

    let report = engine.health_check();
    assert!(report.is_healthy());
    assert!(report.issues.is_empty());
}

#[tokio::test]
async fn test_predict_issues_empty_on_fresh_data() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();
    assert!(engine.predict_issues().is_empty());
}

#[tokio::test]
async fn test_repair_sweep_noop_on_healthy_data() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();
    assert_eq!(engine.repair_sweep(), 0);
}

#[tokio::test]
async fn test_sync_converges_with_zero_peers() {
    let engine = Engine::new(EngineConfig {
        enable_auto_repair: false,
        ..Default::default()
    });

    for i in 0..5 {
        engine.set(&format!("k{}", i), json!({"i": i}), None).await.unwrap();
    }
    assert_eq!(engine.pending_records().await.len(), 5);

    let result = engine.sync().await;
    assert!(result.success);
    assert_eq!(result.records_synced, 5);
    assert!(result.errors.is_empty());
    assert!(engine.pending_records().await.is_empty());

    for record in engine.query(&QueryOptions::default()) {
        assert_eq!(record.metadata.sync_state, SyncState::Synced);
    }
}

#[tokio::test]
async fn test_sync_delivers_to_registered_peers() {
    let transport = Arc::new(CountingTransport::default());
    let engine = Engine::with_transport(
        EngineConfig {
            enable_auto_repair: false,
            ..Default::default()
        },
        Arc::clone(&transport) as Arc<dyn PeerTransport>,
    );

    assert!(engine.add_peer("replica-1").await);
    assert!(engine.add_peer("replica-2").await);
    assert!(!engine.add_peer("replica-1").await);

    engine.set("k", json!({}), None).await.unwrap();
    let result = engine.sync().await;

    assert!(result.success);
    assert_eq!(transport.deliveries.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failed_sync_retries_next_cycle() {
    let transport = Arc::new(CountingTransport {
        fail: true,
        ..Default::default()
    });
    let engine = Engine::with_transport(
        EngineConfig {
            enable_auto_repair: false,
            ..Default::default()
        },
        Arc::clone(&transport) as Arc<dyn PeerTransport>,
    );
    engine.add_peer("replica-1").await;

    engine.set("k", json!({}), None).await.unwrap();

    let result = engine.sync().await;
    assert!(!result.success);
    assert_eq!(result.records_synced, 0);
    assert!(!result.errors.is_empty());

    // Record stays queued and is marked failed
    assert_eq!(engine.pending_records().await.len(), 1);
    let records = engine.query(&QueryOptions::default());
    assert_eq!(records[0].metadata.sync_state, SyncState::Failed);

    // Peer drops out; retry succeeds trivially
    engine.remove_peer("replica-1").await;
    let result = engine.sync().await;
    assert!(result.success);
    assert_eq!(result.records_synced, 1);
    assert!(engine.pending_records().await.is_empty());
}

#[tokio::test]
async fn test_writes_coalesce_before_sync() {
    let engine = Engine::new(EngineConfig {
        enable_auto_repair: false,
        ..Default::default()
    });

    engine.set("k", json!({"v": 1}), None).await.unwrap();
    engine.set("k", json!({"v": 2}), None).await.unwrap();
    engine.set("k", json!({"v": 3}), None).await.unwrap();

    let pending = engine.pending_records().await;
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].value, json!({"v": 3}));

    let result = engine.sync().await;
    assert_eq!(result.records_synced, 1);
}

#[tokio::test]
async fn test_write_back_skips_record_overwritten_mid_cycle() {
    let mut tiers = TierManager::new(TieringPolicy::default(), u64::MAX);
    let mut coord = ReplicationCoordinator::new(true, 16);

    let first = tiers.set("k", json!({"v": 1}), Tier::Hot).unwrap();
    coord.queue(first);
    let outcome = coord.perform_sync(&LoopbackTransport).await;

    // Key overwritten between the cycle and the write-back
    tiers.set("k", json!({"v": 2}), Tier::Hot).unwrap();

    for (key, id) in &outcome.synced {
        tiers.set_sync_state(key, *id, SyncState::Synced);
    }

    // The fresh record was never delivered and must stay pending
    let record = tiers.get("k").unwrap();
    assert_eq!(record.value, json!({"v": 2}));
    assert_eq!(record.metadata.sync_state, SyncState::Pending);
}

#[tokio::test]
async fn test_sync_status_surface() {
    let engine = Engine::new(EngineConfig {
        enable_auto_repair: false,
        ..Default::default()
    });
    engine.add_peer("replica-1").await;
    engine.set("k", json!({}), None).await.unwrap();

    let status = engine.sync_status().await;
    assert!(status.enabled);
    assert_eq!(status.queue_depth, 1);
    assert_eq!(status.peer_count, 1);
    assert!(status.last_result.is_none());

    engine.sync().await;
    let status = engine.sync_status().await;
    assert_eq!(status.queue_depth, 0);
    assert!(status.last_result.unwrap().success);
}

#[tokio::test]
async fn test_disabled_sync_queues_nothing() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();
    assert!(engine.pending_records().await.is_empty());
}

#[tokio::test]
async fn test_optimize_tiers_noop_on_fresh_data() {
    let engine = quiet_engine();
    engine.set("a", json!(1), None).await.unwrap();
    engine.set("b", json!(2), Some(Tier::Warm)).await.unwrap();
    assert_eq!(engine.optimize_tiers(), 0);
}

#[tokio::test]
async fn test_hot_capacity_enforced_through_facade() {
    let engine = Engine::new(EngineConfig {
        max_hot_bytes: 200,
        enable_sync: false,
        enable_auto_repair: false,
        ..Default::default()
    });

    let padding = "x".repeat(100);
    for i in 0..4 {
        engine
            .set(&format!("k{}", i), json!({ "pad": padding }), None)
            .await
            .unwrap();
    }

    let moved = engine.optimize_tiers();
    assert!(moved > 0);

    let stats = engine.stats().await;
    assert!(stats.storage.hot.bytes <= 200);
    assert_eq!(stats.storage.total.count, 4);
}

#[tokio::test]
async fn test_stats_aggregate_all_subsystems() {
    let engine = Engine::new(EngineConfig {
        enable_auto_repair: false,
        ..Default::default()
    });
    engine.set("a", json!({"v": 1}), None).await.unwrap();
    engine.set("b", json!({"v": 2}), Some(Tier::Cold)).await.unwrap();
    engine.sync().await;

    let stats = engine.stats().await;
    assert_eq!(stats.storage.total.count, 2);
    assert_eq!(stats.storage.hot.count, 1);
    assert_eq!(stats.storage.cold.count, 1);
    assert_eq!(stats.sync.total_syncs, 1);
    assert_eq!(stats.sync.total_records_synced, 2);
    assert_eq!(stats.repair.total_repairs, 0);
}

#[tokio::test]
async fn test_lifecycle_states() {
    let engine = quiet_engine();
    assert_eq!(engine.state(), EngineState::Created);
    assert!(!engine.is_running());

    engine.initialize();
    assert_eq!(engine.state(), EngineState::Running);
    assert!(engine.is_running());

    // Idempotent while running
    engine.initialize();
    assert!(engine.is_running());

    engine.shutdown().await;
    assert_eq!(engine.state(), EngineState::Stopped);
    assert!(!engine.is_running());
}

#[tokio::test]
async fn test_shutdown_without_initialize() {
    let engine = quiet_engine();
    engine.shutdown().await;
    assert_eq!(engine.state(), EngineState::Stopped);

    // Double shutdown is safe
    engine.shutdown().await;
    assert_eq!(engine.state(), EngineState::Stopped);
}

#[tokio::test]
async fn test_engine_usable_without_initialize() {
    let engine = quiet_engine();
    engine.set("k", json!({}), None).await.unwrap();
    assert_eq!(engine.get("k"), Some(json!({})));
}

#[tokio::test(start_paused = true)]
async fn test_sync_worker_drains_queue() {
    let engine = Arc::new(Engine::new(EngineConfig {
        enable_auto_repair: false,
        sync_interval_ms: 100,
        ..Default::default()
    }));
    engine.initialize();

    engine.set("k", json!({}), None).await.unwrap();
    assert_eq!(engine.pending_records().await.len(), 1);

    // Let a few worker intervals elapse
    for _ in 0..5 {
        tokio::time::advance(std::time::Duration::from_millis(101)).await;
        tokio::task::yield_now().await;
    }

    assert!(engine.pending_records().await.is_empty());
    engine.shutdown().await;
}
