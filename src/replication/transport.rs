//! Peer delivery seam.
//!
//! The engine does not implement network transport. Delivery to a replica
//! peer is abstracted behind [`PeerTransport`]; the surrounding system
//! supplies an implementation (and owns per-peer timeouts at that
//! boundary). [`LoopbackTransport`] is the default when no transport is
//! injected: every delivery succeeds locally.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::Record;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("peer '{peer}' unreachable: {reason}")]
    Unreachable { peer: String, reason: String },
    #[error("peer '{peer}' rejected record '{key}': {reason}")]
    Rejected {
        peer: String,
        key: String,
        reason: String,
    },
}

/// Delivers one record to one peer.
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn deliver(&self, peer_id: &str, record: &Record) -> Result<(), TransportError>;
}

/// Transport that accepts every delivery without going anywhere.
#[derive(Debug, Default)]
pub struct LoopbackTransport;

#[async_trait]
impl PeerTransport for LoopbackTransport {
    async fn deliver(&self, _peer_id: &str, _record: &Record) -> Result<(), TransportError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Tier;
    use serde_json::json;

    #[tokio::test]
    async fn test_loopback_always_delivers() {
        let transport = LoopbackTransport;
        let record = Record::new("k".to_string(), json!({}), Tier::Hot);
        assert!(transport.deliver("peer-1", &record).await.is_ok());
    }

    #[test]
    fn test_transport_error_display() {
        let err = TransportError::Unreachable {
            peer: "replica-2".to_string(),
            reason: "connection refused".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("replica-2"));
        assert!(msg.contains("connection refused"));
    }
}
