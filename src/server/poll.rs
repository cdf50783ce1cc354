//! # Poll Loop
//!
//! Background task that runs a collection round, publishes the result, sleeps for
//! the poll interval, and repeats until shutdown.
//!
//! A failed round is logged and skipped; the store keeps serving the previous
//! snapshot. The sleep is separate from the round timeout, so one cycle takes
//! roughly `round time + interval`.

use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::collect::Collector;
use crate::state::SnapshotStore;

pub struct PollLoop {
    collector: Arc<Collector>,
    store: Arc<SnapshotStore>,
    interval: Duration,
}

impl PollLoop {
    pub fn new(collector: Arc<Collector>, store: Arc<SnapshotStore>, interval: Duration) -> Self {
        Self {
            collector,
            store,
            interval,
        }
    }

    /// Run a single iteration. Returns whether the store was updated.
    pub async fn run_once(&self) -> bool {
        match self.collector.collect().await {
            Ok(round) => {
                let first = !self.store.is_populated().await;
                self.store.update(round).await;
                if first {
                    info!("📊 First snapshot published, /api now serves data");
                }
                true
            }
            Err(e) => {
                warn!("⚠️  Skipping round, previous snapshot stays in place: {}", e);
                false
            }
        }
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A round in progress is abandoned when shutdown arrives.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            "🔁 Polling namespace '{}' every {:?}",
            self.collector.namespace(),
            self.interval
        );

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = self.run_once() => {}
                _ = shutdown.changed() => break,
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("🛑 Poll loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collect::PeerProber;
    use crate::common::error::DirectoryError;
    use crate::common::messages::{PeerEndpoint, PeerRecord};
    use crate::discovery::{PeerDirectory, StaticDirectory};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Fails every other call.
    struct FlakyDirectory {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PeerDirectory for FlakyDirectory {
        async fn list_peers(&self, _namespace: &str) -> Result<Vec<PeerEndpoint>, DirectoryError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call % 2 == 1 {
                return Err(DirectoryError::unavailable("flaky"));
            }
            Ok(vec![PeerEndpoint::new(format!("peer-{}", call), None)])
        }
    }

    fn poll_loop(directory: Arc<dyn PeerDirectory>, store: Arc<SnapshotStore>) -> PollLoop {
        let collector = Collector::new(
            "bully",
            Duration::from_millis(200),
            directory,
            PeerProber::new(reqwest::Client::new(), "/metrics"),
        );
        PollLoop::new(Arc::new(collector), store, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_failed_round_keeps_previous_snapshot() {
        let store = Arc::new(SnapshotStore::new());
        let directory = Arc::new(FlakyDirectory {
            calls: AtomicUsize::new(0),
        });
        let poller = poll_loop(directory, Arc::clone(&store));

        assert!(poller.run_once().await);
        let before = store.read().await.unwrap();
        assert_eq!(before.replicas, vec![PeerRecord::unknown("peer-0")]);

        assert!(!poller.run_once().await);
        let after = store.read().await.unwrap();
        assert_eq!(*before, *after);
    }

    #[tokio::test]
    async fn test_failed_first_round_leaves_store_uninitialized() {
        struct DownDirectory;

        #[async_trait]
        impl PeerDirectory for DownDirectory {
            async fn list_peers(&self, _namespace: &str) -> Result<Vec<PeerEndpoint>, DirectoryError> {
                Err(DirectoryError::unavailable("down"))
            }
        }

        let store = Arc::new(SnapshotStore::new());
        let poller = poll_loop(Arc::new(DownDirectory), Arc::clone(&store));

        assert!(!poller.run_once().await);
        assert!(store.read().await.is_none());
    }

    #[tokio::test]
    async fn test_run_survives_failures_and_stops_on_shutdown() {
        let store = Arc::new(SnapshotStore::new());
        let directory = Arc::new(FlakyDirectory {
            calls: AtomicUsize::new(0),
        });
        let poller = poll_loop(directory.clone(), Arc::clone(&store));
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(async move { poller.run(rx).await });

        tokio::time::sleep(Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("poll loop did not stop")
            .unwrap();

        assert!(directory.calls.load(Ordering::SeqCst) >= 3);
        assert!(store.read().await.is_some());
    }

    #[tokio::test]
    async fn test_first_successful_round_populates_store() {
        let store = Arc::new(SnapshotStore::new());
        let directory = Arc::new(FlakyDirectory {
            calls: AtomicUsize::new(1),
        });
        let poller = poll_loop(directory, Arc::clone(&store));

        assert!(!poller.run_once().await);
        assert!(!store.is_populated().await);

        assert!(poller.run_once().await);
        assert!(store.is_populated().await);
        assert_eq!(
            store.read().await.unwrap().replicas,
            vec![PeerRecord::unknown("peer-2")]
        );
    }

    #[tokio::test]
    async fn test_static_directory_round_publishes() {
        let store = Arc::new(SnapshotStore::new());
        let directory = Arc::new(StaticDirectory::new(vec![
            PeerEndpoint::new("A", None),
            PeerEndpoint::new("B", None),
        ]));
        let poller = poll_loop(directory, Arc::clone(&store));

        assert!(poller.run_once().await);
        assert_eq!(store.read().await.unwrap().leader_name, "B");
    }
}
