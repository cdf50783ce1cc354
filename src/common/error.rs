//! # Error Types
//!
//! Failures that leave a component boundary. Per-peer probe failures are not here:
//! they are absorbed by the prober (see [`crate::collect::ProbeError`]).

use thiserror::Error;

/// The peer list could not be obtained. The round is skipped and the previous
/// snapshot stays authoritative.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// Directory API could not be reached or answered with an error status
    #[error("peer directory unavailable: {message}")]
    Unavailable { message: String },

    /// Directory API answered with a body that does not decode
    #[error("peer directory returned malformed response: {message}")]
    Malformed { message: String },

    /// Directory client could not be constructed (startup only)
    #[error("couldn't configure peer directory: {message}")]
    Setup { message: String },
}

impl DirectoryError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }
}

/// Missing or invalid settings at startup. Always fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("namespace wasn't set")]
    MissingNamespace,

    #[error("invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}
