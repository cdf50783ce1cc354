//! # Common Components
//!
//! Shared data structures used across the dashboard.
//!
//! ## Modules
//!
//! - [`messages`]: Peer endpoints, peer records and the peer metrics wire format
//! - [`config`]: Configuration loading (TOML file plus environment overrides)
//! - [`error`]: Directory and configuration errors

pub mod config;
pub mod error;
pub mod messages;

pub use error::{ConfigError, DirectoryError};
pub use messages::{PeerEndpoint, PeerRecord};
