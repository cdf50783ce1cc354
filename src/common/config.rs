//! # Configuration
//!
//! Dashboard settings come from three layers, lowest precedence first:
//! 1. Built-in defaults
//! 2. An optional TOML file (`--config`)
//! 3. Environment variables (`TARGET_NAMESPACE`, `DASHBOARD_BIND`,
//!    `COLLECT_TIMEOUT_SECS`, `POLL_INTERVAL_SECS`)
//!
//! The namespace has no default. Startup fails without it.
//!
//! ## Example file
//!
//! ```toml
//! [dashboard]
//! namespace = "bully"
//! bind_address = "0.0.0.0:80"
//!
//! [collection]
//! timeout_secs = 5
//! poll_interval_secs = 1
//!
//! [directory]
//! kind = "static"
//! peers = [
//!     { name = "bully-0", address = "10.0.0.10" },
//!     { name = "bully-1", address = "10.0.0.11" },
//! ]
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use super::error::ConfigError;
use super::messages::PeerEndpoint;

pub const ENV_NAMESPACE: &str = "TARGET_NAMESPACE";
pub const ENV_BIND: &str = "DASHBOARD_BIND";
pub const ENV_TIMEOUT: &str = "COLLECT_TIMEOUT_SECS";
pub const ENV_INTERVAL: &str = "POLL_INTERVAL_SECS";

/// Upper bound for every duration setting (one hour).
pub const MAX_DURATION_SECS: u64 = 3600;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Arguments
/// - `path`: Path to the TOML configuration file
///
/// # Returns
/// - `Ok(T)`: Successfully loaded and parsed configuration
/// - `Err`: File I/O or parsing error
pub fn load_config<T>(path: &str) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Complete dashboard configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub dashboard: DashboardInfo,
    pub collection: CollectionConfig,
    pub directory: DirectoryConfig,
    pub shutdown: ShutdownConfig,
}

/// Identity of the observed group and where the dashboard listens.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardInfo {
    /// Namespace (group) whose peers are observed
    pub namespace: String,
    /// HTTP listen address
    pub bind_address: String,
}

impl Default for DashboardInfo {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            bind_address: "0.0.0.0:80".to_string(),
        }
    }
}

/// Collection round timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionConfig {
    /// Deadline shared by all probes of one round (seconds)
    pub timeout_secs: u64,
    /// Pause between two rounds (seconds)
    pub poll_interval_secs: u64,
    /// Path of the peer metrics endpoint
    pub metrics_path: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 5,
            poll_interval_secs: 1,
            metrics_path: "/metrics".to_string(),
        }
    }
}

impl CollectionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Which peer directory backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectoryKind {
    /// List pods through the Kubernetes API (in-cluster credentials)
    #[default]
    Kubernetes,
    /// Fixed peer list from this file
    Static,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    pub kind: DirectoryKind,
    /// Peers for the static directory
    pub peers: Vec<PeerInfo>,
}

impl DirectoryConfig {
    pub fn endpoints(&self) -> Vec<PeerEndpoint> {
        self.peers
            .iter()
            .map(|peer| PeerEndpoint::new(peer.name.clone(), peer.address.clone()))
            .collect()
    }
}

/// A statically configured peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    pub name: String,
    /// Network address (e.g., "10.0.0.10" or "127.0.0.1:8001")
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// How long in-flight HTTP requests may drain after a shutdown signal (seconds)
    pub grace_secs: u64,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self { grace_secs: 10 }
    }
}

impl ShutdownConfig {
    pub fn grace(&self) -> Duration {
        Duration::from_secs(self.grace_secs)
    }
}

impl DashboardConfig {
    /// Build the effective configuration: defaults, then the optional file, then
    /// the process environment. The result is validated.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config: DashboardConfig = match path {
            Some(path) => load_config(path)?,
            None => DashboardConfig::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Apply overrides from a key lookup (the environment in production).
    ///
    /// Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(namespace) = value(ENV_NAMESPACE) {
            self.dashboard.namespace = namespace.trim().to_string();
        }
        if let Some(bind) = value(ENV_BIND) {
            self.dashboard.bind_address = bind.trim().to_string();
        }
        if let Some(timeout) = value(ENV_TIMEOUT) {
            self.collection.timeout_secs = parse_secs(ENV_TIMEOUT, &timeout)?;
        }
        if let Some(interval) = value(ENV_INTERVAL) {
            self.collection.poll_interval_secs = parse_secs(ENV_INTERVAL, &interval)?;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.namespace.trim().is_empty() {
            return Err(ConfigError::MissingNamespace);
        }
        check_secs("collection.timeout_secs", self.collection.timeout_secs)?;
        check_secs("collection.poll_interval_secs", self.collection.poll_interval_secs)?;
        if self.shutdown.grace_secs > MAX_DURATION_SECS {
            return Err(ConfigError::invalid(
                "shutdown.grace_secs",
                format!("must be at most {}", MAX_DURATION_SECS),
            ));
        }
        if !self.collection.metrics_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "collection.metrics_path",
                "must start with '/'",
            ));
        }
        if self.directory.kind == DirectoryKind::Static
            && self.directory.peers.iter().any(|peer| peer.name.is_empty())
        {
            return Err(ConfigError::invalid("directory.peers", "peer name is empty"));
        }

        Ok(())
    }
}

/// Positive and no larger than [`MAX_DURATION_SECS`].
fn check_secs(key: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 {
        return Err(ConfigError::invalid(key, "must be positive"));
    }
    if secs > MAX_DURATION_SECS {
        return Err(ConfigError::invalid(
            key,
            format!("must be at most {}", MAX_DURATION_SECS),
        ));
    }
    Ok(())
}

fn parse_secs(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::invalid(key, e.to_string()))
}
