//! Configuration for the tier engine.
//!
//! # Example
//!
//! ```
//! use tier_engine::EngineConfig;
//!
//! // Minimal config (uses defaults)
//! let config = EngineConfig::default();
//! assert_eq!(config.hot_threshold, 100);
//! assert_eq!(config.sync_interval_ms, 5000);
//!
//! // Full config
//! let config = EngineConfig {
//!     hot_threshold: 50,
//!     max_hot_bytes: 16 * 1024 * 1024, // 16 MB
//!     enable_sync: false,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

use crate::tiering::TieringPolicy;

/// Configuration for the tier engine.
///
/// All fields have sensible defaults. The tiering policy is immutable after
/// construction; build a new engine to change it.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Access count at which a record is promoted to HOT
    #[serde(default = "default_hot_threshold")]
    pub hot_threshold: u64,

    /// Access count at which a record is promoted to WARM
    #[serde(default = "default_warm_threshold")]
    pub warm_threshold: u64,

    /// Days without access before demotion to COLD
    #[serde(default = "default_cold_threshold_days")]
    pub cold_threshold_days: f64,

    /// Days without access before demotion to ARCHIVE
    #[serde(default = "default_archive_threshold_days")]
    pub archive_threshold_days: f64,

    /// HOT tier capacity in bytes (default: 100 MB)
    #[serde(default = "default_max_hot_bytes")]
    pub max_hot_bytes: u64,

    /// Run health checks on access and periodic repair sweeps
    #[serde(default = "default_enable_auto_repair")]
    pub enable_auto_repair: bool,

    /// Queue writes for peer replication
    #[serde(default = "default_enable_sync")]
    pub enable_sync: bool,

    /// Replication cycle interval in milliseconds (0 disables the worker)
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// Integrity sweep interval in seconds
    #[serde(default = "default_integrity_sweep_secs")]
    pub integrity_sweep_secs: u64,

    /// Tier optimization interval in seconds
    #[serde(default = "default_tier_optimize_secs")]
    pub tier_optimize_secs: u64,

    /// Max retained sync results for statistics
    #[serde(default = "default_sync_history_cap")]
    pub sync_history_cap: usize,
}

fn default_hot_threshold() -> u64 { 100 }
fn default_warm_threshold() -> u64 { 10 }
fn default_cold_threshold_days() -> f64 { 30.0 }
fn default_archive_threshold_days() -> f64 { 90.0 }
fn default_max_hot_bytes() -> u64 { 100 * 1024 * 1024 } // 100 MB
fn default_enable_auto_repair() -> bool { true }
fn default_enable_sync() -> bool { true }
fn default_sync_interval_ms() -> u64 { 5000 }
fn default_integrity_sweep_secs() -> u64 { 60 }
fn default_tier_optimize_secs() -> u64 { 300 }
fn default_sync_history_cap() -> usize { 256 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hot_threshold: default_hot_threshold(),
            warm_threshold: default_warm_threshold(),
            cold_threshold_days: default_cold_threshold_days(),
            archive_threshold_days: default_archive_threshold_days(),
            max_hot_bytes: default_max_hot_bytes(),
            enable_auto_repair: default_enable_auto_repair(),
            enable_sync: default_enable_sync(),
            sync_interval_ms: default_sync_interval_ms(),
            integrity_sweep_secs: default_integrity_sweep_secs(),
            tier_optimize_secs: default_tier_optimize_secs(),
            sync_history_cap: default_sync_history_cap(),
        }
    }
}

impl EngineConfig {
    /// The tiering policy described by the threshold fields.
    #[must_use]
    pub fn tiering_policy(&self) -> TieringPolicy {
        TieringPolicy {
            hot_threshold: self.hot_threshold,
            warm_threshold: self.warm_threshold,
            cold_threshold_days: self.cold_threshold_days,
            archive_threshold_days: self.archive_threshold_days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = EngineConfig::default();
        assert_eq!(config.hot_threshold, 100);
        assert_eq!(config.warm_threshold, 10);
        assert_eq!(config.cold_threshold_days, 30.0);
        assert_eq!(config.archive_threshold_days, 90.0);
        assert_eq!(config.max_hot_bytes, 100 * 1024 * 1024);
    }

    #[test]
    fn test_default_workers_enabled() {
        let config = EngineConfig::default();
        assert!(config.enable_auto_repair);
        assert!(config.enable_sync);
        assert_eq!(config.sync_interval_ms, 5000);
        assert_eq!(config.integrity_sweep_secs, 60);
        assert_eq!(config.tier_optimize_secs, 300);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.hot_threshold, 100);
        assert!(config.enable_sync);
    }

    #[test]
    fn test_deserialize_partial_override() {
        let config: EngineConfig =
            serde_json::from_str(r#"{"hot_threshold": 5, "enable_sync": false}"#).unwrap();
        assert_eq!(config.hot_threshold, 5);
        assert!(!config.enable_sync);
        assert_eq!(config.warm_threshold, 10);
    }

    #[test]
    fn test_tiering_policy_mirrors_config() {
        let config = EngineConfig {
            hot_threshold: 7,
            warm_threshold: 3,
            cold_threshold_days: 14.0,
            archive_threshold_days: 60.0,
            ..Default::default()
        };
        let policy = config.tiering_policy();
        assert_eq!(policy.hot_threshold, 7);
        assert_eq!(policy.warm_threshold, 3);
        assert_eq!(policy.cold_threshold_days, 14.0);
        assert_eq!(policy.archive_threshold_days, 60.0);
    }
}
