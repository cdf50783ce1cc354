//! # Snapshot Store
//!
//! Holds the latest published view of the group. The poll loop is the only writer;
//! HTTP handlers read concurrently.
//!
//! ```text
//! Uninitialized --update--> Populated --update--> Populated ...
//! ```
//!
//! Every `update` swaps in a whole new [`Snapshot`] under the write lock, so a
//! reader sees either the previous round or the new one, never a mix.

use log::debug;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::common::messages::PeerRecord;

/// Published aggregate of one round.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Leader as derived by [`derive_leader`]
    pub leader_name: String,
    pub replicas: Vec<PeerRecord>,
}

impl Snapshot {
    pub fn from_round(replicas: Vec<PeerRecord>) -> Self {
        Self {
            leader_name: derive_leader(&replicas),
            replicas,
        }
    }

    /// True when the round had no peers.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }
}

/// The lexicographically greatest peer name, or empty for an empty round.
///
/// This is the selection rule the observed deployment uses; it does not look at
/// what the peers report as their leader.
pub fn derive_leader(records: &[PeerRecord]) -> String {
    records
        .iter()
        .map(|record| record.name.as_str())
        .max()
        .unwrap_or_default()
        .to_string()
}

/// Single-writer, many-reader holder of the current [`Snapshot`].
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the published snapshot with one built from `round`.
    pub async fn update(&self, round: Vec<PeerRecord>) {
        // Build outside the lock; the write section is a pointer swap.
        let snapshot = Arc::new(Snapshot::from_round(round));

        debug!(
            "📝 Snapshot updated: leader '{}', {} replica(s)",
            snapshot.leader_name,
            snapshot.replicas.len()
        );

        *self.current.write().await = Some(snapshot);
    }

    /// Current snapshot, or `None` before the first successful round.
    pub async fn read(&self) -> Option<Arc<Snapshot>> {
        self.current.read().await.clone()
    }

    /// Whether a round has been published yet.
    pub async fn is_populated(&self) -> bool {
        self.current.read().await.is_some()
    }
}
