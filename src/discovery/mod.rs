//! # Peer Discovery
//!
//! Lists the peers of one namespace. Two backends:
//! - [`KubernetesDirectory`]: pods of a namespace, read through the cluster API
//! - [`StaticDirectory`]: a fixed list from the configuration file
//!
//! Directories never retry. A failed listing skips the round and the next poll
//! cycle tries again.

pub mod directory;
pub mod kubernetes;

pub use directory::{PeerDirectory, StaticDirectory};
pub use kubernetes::KubernetesDirectory;
