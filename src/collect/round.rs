//! # Collection Round
//!
//! One round:
//! 1. List peers through the directory (a failure here fails the round)
//! 2. Fix a single deadline for the whole fan-out
//! 3. Spawn one probe task per peer, all sharing that deadline
//! 4. Join every task before returning
//!
//! The result holds exactly one record per listed peer, in directory order.
//! Probe failures and panicked probe tasks become unknown records.

use futures_util::future::{join_all, FutureExt};
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;

use super::prober::PeerProber;
use crate::common::error::DirectoryError;
use crate::common::messages::{PeerEndpoint, PeerRecord};
use crate::discovery::PeerDirectory;

/// Output of one round: one record per discovered peer.
pub type RoundResult = Vec<PeerRecord>;

/// Slack given to probe tasks after the round deadline before they are abandoned.
const JOIN_GRACE: Duration = Duration::from_millis(250);

/// Longest round deadline the coordinator will schedule.
pub const MAX_ROUND_TIMEOUT: Duration = Duration::from_secs(3600);

/// Runs collection rounds for one namespace.
pub struct Collector {
    namespace: String,
    timeout: Duration,
    directory: Arc<dyn PeerDirectory>,
    prober: Arc<PeerProber>,
}

impl Collector {
    /// # Panics
    /// If `namespace` is empty.
    pub fn new(
        namespace: impl Into<String>,
        timeout: Duration,
        directory: Arc<dyn PeerDirectory>,
        prober: PeerProber,
    ) -> Self {
        let namespace = namespace.into();
        assert!(!namespace.is_empty(), "namespace must not be empty");

        Self {
            namespace,
            timeout,
            directory,
            prober: Arc::new(prober),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Run one round.
    ///
    /// Fails only when the directory fails. Individual peers never fail a round.
    pub async fn collect(&self) -> Result<RoundResult, DirectoryError> {
        debug!("🔄 Collection started for namespace '{}'", self.namespace);

        let peers = match self.directory.list_peers(&self.namespace).await {
            Ok(peers) => peers,
            Err(e) => {
                error!(
                    "❌ Couldn't list peers in namespace '{}': {}",
                    self.namespace, e
                );
                return Err(e);
            }
        };

        debug!("📋 Directory returned {} peer(s)", peers.len());

        let deadline = round_deadline(self.timeout);
        let records = self.collect_from_peers(peers, deadline).await;

        debug!(
            "✅ Collection finished: {} record(s), {} unknown",
            records.len(),
            records.iter().filter(|r| r.is_unknown()).count()
        );

        Ok(records)
    }

    async fn collect_from_peers(&self, peers: Vec<PeerEndpoint>, deadline: Instant) -> RoundResult {
        if peers.is_empty() {
            return Vec::new();
        }

        let handles: Vec<_> = peers
            .iter()
            .map(|peer| {
                let prober = Arc::clone(&self.prober);
                let peer = peer.clone();
                tokio::spawn(async move { prober.probe(&peer, deadline).await })
            })
            .collect();

        // Probes bound themselves by the deadline; the grace only covers scheduling.
        let join_deadline = deadline.checked_add(JOIN_GRACE).unwrap_or(deadline);
        let names = peers.into_iter().map(|peer| peer.name).collect();

        join_probes(names, handles, join_deadline).await
    }
}

/// Round deadline `timeout` from now. Durations too large for the clock are
/// capped at [`MAX_ROUND_TIMEOUT`].
fn round_deadline(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + MAX_ROUND_TIMEOUT)
}

/// Wait for every probe task until `join_deadline`, one record per name.
///
/// Tasks that finished keep their record. Tasks still running at the deadline
/// are aborted and, like panicked tasks, become unknown records.
async fn join_probes(
    names: Vec<String>,
    mut handles: Vec<JoinHandle<PeerRecord>>,
    join_deadline: Instant,
) -> RoundResult {
    let joined =
        tokio::time::timeout_at(join_deadline, join_all(handles.iter_mut())).await;

    match joined {
        Ok(outcomes) => names
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| task_record(name, outcome))
            .collect(),
        Err(_) => {
            warn!("⚠️  Probe tasks still running past the round deadline, abandoning them");
            names
                .into_iter()
                .zip(handles.iter_mut())
                .map(|(name, handle)| match (&mut *handle).now_or_never() {
                    Some(outcome) => task_record(name, outcome),
                    None => {
                        handle.abort();
                        warn!("⚠️  Peer '{}' stalled, reporting it as unknown", name);
                        PeerRecord::unknown(name)
                    }
                })
                .collect()
        }
    }
}

fn task_record(name: String, outcome: Result<PeerRecord, JoinError>) -> PeerRecord {
    match outcome {
        Ok(record) => record,
        Err(e) => {
            warn!("⚠️  Probe task for peer '{}' failed: {}", name, e);
            PeerRecord::unknown(name)
        }
    }
}
