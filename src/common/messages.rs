//! # Wire Types
//!
//! Data exchanged between the dashboard, the peer directory and the observed peers:
//! - [`PeerEndpoint`]: one peer as reported by the directory (name plus optional address)
//! - [`PeerRecord`]: one peer's self-reported election status
//! - [`MetricsReport`]: the JSON body a peer serves on its metrics endpoint
//!
//! A record with empty `leader` and `state` means "unknown". It looks exactly like
//! a peer that reported nothing.

use serde::{Deserialize, Serialize};

/// A peer as returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerEndpoint {
    /// Stable peer name (pod name in Kubernetes)
    pub name: String,
    /// Network address (`ip` or `ip:port`). `None` when the peer has no address yet.
    pub address: Option<String>,
}

impl PeerEndpoint {
    pub fn new(name: impl Into<String>, address: Option<String>) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }
}

/// Last known status of one peer.
///
/// Serialized as `{name, leader?, state?}`: empty fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerRecord {
    pub name: String,
    /// Who the peer believes the leader is
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub leader: String,
    /// Election protocol state label (opaque)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub state: String,
}

impl PeerRecord {
    pub fn new(name: impl Into<String>, leader: impl Into<String>, state: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            leader: leader.into(),
            state: state.into(),
        }
    }

    /// Record used when the peer could not be probed.
    pub fn unknown(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.leader.is_empty() && self.state.is_empty()
    }
}

/// Body of `GET /metrics` on a peer.
///
/// `leader` and `state` may be missing or `null`.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsReport {
    pub name: String,
    #[serde(default)]
    pub leader: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

impl MetricsReport {
    /// Convert into a record, falling back to the directory name if the peer
    /// reported an empty one.
    pub fn into_record(self, fallback_name: &str) -> PeerRecord {
        let name = if self.name.is_empty() {
            fallback_name.to_string()
        } else {
            self.name
        };

        PeerRecord {
            name,
            leader: self.leader.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
        }
    }
}
