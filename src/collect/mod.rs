//! # Collection
//!
//! - [`prober`]: fetch one peer's state, degrading every failure to an unknown record
//! - [`round`]: fan out probes to all discovered peers under one shared deadline

pub mod prober;
pub mod round;

pub use prober::{PeerProber, ProbeError};
pub use round::{Collector, RoundResult};
