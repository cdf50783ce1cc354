//! # Published State
//!
//! [`SnapshotStore`] owns the latest [`Snapshot`]. It is created once at startup
//! and shared by handle (`Arc`) with the poll loop and the HTTP handlers.

pub mod store;

pub use store::{derive_leader, Snapshot, SnapshotStore};
