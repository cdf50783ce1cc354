use async_trait::async_trait;

use crate::common::error::DirectoryError;
use crate::common::messages::PeerEndpoint;

/// Source of the current peer list.
///
/// `namespace` must be non-empty. Implementations panic otherwise: passing an
/// empty namespace is a programming error, not a runtime condition.
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Return the current peers of `namespace`, in directory order.
    async fn list_peers(&self, namespace: &str) -> Result<Vec<PeerEndpoint>, DirectoryError>;
}

pub(crate) fn assert_namespace(namespace: &str) {
    assert!(!namespace.is_empty(), "namespace must not be empty");
}

/// Directory backed by a fixed peer list. The namespace is not used for filtering.
pub struct StaticDirectory {
    peers: Vec<PeerEndpoint>,
}

impl StaticDirectory {
    pub fn new(peers: Vec<PeerEndpoint>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl PeerDirectory for StaticDirectory {
    async fn list_peers(&self, namespace: &str) -> Result<Vec<PeerEndpoint>, DirectoryError> {
        assert_namespace(namespace);
        Ok(self.peers.clone())
    }
}
