//! Record data structure.
//!
//! The [`Record`] is the fundamental unit owned by the engine. Each record
//! carries its placement tier, access bookkeeping, a content checksum, and
//! replication state. The engine hands out clones only; callers never hold
//! references into the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Storage tier, ordered fastest to slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hot,
    Warm,
    Cold,
    Archive,
}

impl Tier {
    /// All tiers in lookup order (fastest first).
    pub const ACCESS_ORDER: [Tier; 4] = [Tier::Hot, Tier::Warm, Tier::Cold, Tier::Archive];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
            Self::Archive => "archive",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Replication state of a record.
///
/// `Pending → Syncing → Synced`, or `Syncing → Failed` on delivery error.
/// A `Failed` record re-enters `Pending` the next time it is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncState {
    Pending,
    Syncing,
    Synced,
    Failed,
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Syncing => write!(f, "syncing"),
            Self::Synced => write!(f, "synced"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Per-record bookkeeping maintained by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Number of times the record has been read
    pub access_count: u64,
    /// Last access timestamp (epoch millis)
    pub last_accessed_at: i64,
    /// Serialized size of the value in bytes
    pub size_bytes: u64,
    /// SHA-256 hex digest of the serialized value
    pub checksum: String,
    /// Replication state
    pub sync_state: SyncState,
}

/// A single key/value record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque unique identifier, assigned at creation, never reused
    pub id: Uuid,
    /// Caller-supplied key; at most one live record per key across all tiers
    pub key: String,
    /// The payload (caller-opaque)
    pub value: Value,
    /// Tier currently holding the record
    pub tier: Tier,
    /// Access/integrity/replication bookkeeping
    pub metadata: RecordMetadata,
    /// Creation timestamp (epoch millis), immutable
    pub created_at: i64,
}

impl Record {
    /// Create a fresh record. Size and checksum are computed from `value`.
    #[must_use]
    pub fn new(key: String, value: Value, tier: Tier) -> Self {
        let now = now_millis();
        let size_bytes = payload_size(&value);
        let checksum = payload_checksum(&value);
        Self {
            id: Uuid::new_v4(),
            key,
            value,
            tier,
            metadata: RecordMetadata {
                access_count: 0,
                last_accessed_at: now,
                size_bytes,
                checksum,
                sync_state: SyncState::Pending,
            },
            created_at: now,
        }
    }

    /// Record an access: bump the count and refresh the access timestamp.
    pub fn touch(&mut self) {
        self.metadata.access_count = self.metadata.access_count.saturating_add(1);
        self.metadata.last_accessed_at = now_millis();
    }

    /// Days elapsed since the last access, relative to `now_ms`.
    #[must_use]
    pub fn days_since_access(&self, now_ms: i64) -> f64 {
        let elapsed_ms = now_ms.saturating_sub(self.metadata.last_accessed_at).max(0);
        elapsed_ms as f64 / (1000.0 * 60.0 * 60.0 * 24.0)
    }

    /// Recompute size and checksum from the current value.
    pub fn refresh_integrity(&mut self) {
        self.metadata.size_bytes = payload_size(&self.value);
        self.metadata.checksum = payload_checksum(&self.value);
    }
}

/// SHA-256 hex digest of the compact JSON serialization of `value`.
#[must_use]
pub fn payload_checksum(value: &Value) -> String {
    hex::encode(Sha256::digest(value.to_string()))
}

/// Serialized size of `value` in bytes (compact JSON).
#[must_use]
pub fn payload_size(value: &Value) -> u64 {
    value.to_string().len() as u64
}

/// Current wall-clock time as epoch millis.
#[must_use]
pub fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
