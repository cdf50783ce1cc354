pub mod collect;
pub mod common;
pub mod discovery;
pub mod server;
pub mod state;

pub use collect::{Collector, PeerProber};
pub use common::messages::{PeerEndpoint, PeerRecord};
pub use state::{Snapshot, SnapshotStore};
