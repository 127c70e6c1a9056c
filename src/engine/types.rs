//! Engine-level types: lifecycle state, query options, aggregate stats.

use serde::{Deserialize, Serialize};

use crate::integrity::RepairStats;
use crate::record::Tier;
use crate::replication::SyncStats;
use crate::tiering::StorageStats;

/// Lifecycle state of the engine.
///
/// Transitions one way: `Created -> Running -> ShuttingDown -> Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::ShuttingDown => write!(f, "shutting_down"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Field to sort query results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Key,
    CreatedAt,
    AccessCount,
    Size,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Options for [`crate::Engine::query`]. All fields optional; the default
/// returns every record unsorted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryOptions {
    /// Restrict to a single tier
    #[serde(default)]
    pub tier: Option<Tier>,
    /// Maximum records returned, applied after `offset`
    #[serde(default)]
    pub limit: Option<usize>,
    /// Records skipped from the front of the (sorted) result
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub sort_by: Option<SortField>,
    #[serde(default)]
    pub sort_order: SortOrder,
}

/// Aggregate statistics across all engine subsystems.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub storage: StorageStats,
    pub sync: SyncStats,
    pub repair: RepairStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_display() {
        assert_eq!(EngineState::Running.to_string(), "running");
        assert_eq!(EngineState::ShuttingDown.to_string(), "shutting_down");
    }

    #[test]
    fn test_query_options_default() {
        let opts = QueryOptions::default();
        assert!(opts.tier.is_none());
        assert!(opts.limit.is_none());
        assert_eq!(opts.offset, 0);
        assert!(opts.sort_by.is_none());
        assert_eq!(opts.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_query_options_deserialize() {
        let opts: QueryOptions = serde_json::from_str(
            r#"{"tier": "hot", "limit": 10, "sort_by": "access_count", "sort_order": "desc"}"#,
        )
        .unwrap();
        assert_eq!(opts.tier, Some(Tier::Hot));
        assert_eq!(opts.limit, Some(10));
        assert_eq!(opts.sort_by, Some(SortField::AccessCount));
        assert_eq!(opts.sort_order, SortOrder::Desc);
    }
}
