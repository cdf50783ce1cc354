//! # Peer Prober
//!
//! Fetches one peer's self-reported state:
//!
//! ```text
//! GET http://{peer address}/metrics
//! 200 {"name": "...", "leader": "...", "state": "..."}
//! ```
//!
//! [`PeerProber::try_probe`] reports why a probe failed. [`PeerProber::probe`]
//! never fails: every error becomes an unknown record for that peer, so one bad
//! peer cannot abort a round.

use log::{debug, warn};
use std::net::Ipv6Addr;
use thiserror::Error;
use tokio::time::Instant;

use crate::common::messages::{MetricsReport, PeerEndpoint, PeerRecord};

/// Why a single probe produced no record.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("peer has no network address")]
    NoAddress,

    /// Request could not be built, connected or timed out inside the client
    #[error("request failed: {0}")]
    Request(reqwest::Error),

    #[error("peer returned status {0}")]
    Status(u16),

    #[error("couldn't read response body: {0}")]
    Body(reqwest::Error),

    #[error("couldn't decode response body: {0}")]
    Decode(serde_json::Error),

    #[error("round deadline exceeded")]
    DeadlineExceeded,
}

/// Queries peer metrics endpoints.
///
/// Cheap to share: clones of the inner `reqwest::Client` reuse one connection pool.
#[derive(Debug, Clone)]
pub struct PeerProber {
    client: reqwest::Client,
    metrics_path: String,
}

impl PeerProber {
    pub fn new(client: reqwest::Client, metrics_path: impl Into<String>) -> Self {
        Self {
            client,
            metrics_path: metrics_path.into(),
        }
    }

    /// Probe one peer. Resolves to the decoded record, or to an unknown record
    /// when anything goes wrong before `deadline`.
    pub async fn probe(&self, endpoint: &PeerEndpoint, deadline: Instant) -> PeerRecord {
        match self.try_probe(endpoint, deadline).await {
            Ok(record) => record,
            Err(e) => {
                warn!("⚠️  Couldn't probe peer '{}': {}", endpoint.name, e);
                PeerRecord::unknown(endpoint.name.clone())
            }
        }
    }

    /// Probe one peer, reporting the failure reason.
    pub async fn try_probe(
        &self,
        endpoint: &PeerEndpoint,
        deadline: Instant,
    ) -> Result<PeerRecord, ProbeError> {
        let address = endpoint
            .address
            .as_deref()
            .filter(|address| !address.is_empty())
            .ok_or(ProbeError::NoAddress)?;

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(ProbeError::DeadlineExceeded);
        }

        let url = metrics_url(address, &self.metrics_path);

        let fetch = async {
            debug!("📤 Requesting {} for peer '{}'", url, endpoint.name);

            let response = self
                .client
                .get(&url)
                .timeout(remaining)
                .send()
                .await
                .map_err(ProbeError::Request)?;

            let status = response.status();
            if status != reqwest::StatusCode::OK {
                return Err(ProbeError::Status(status.as_u16()));
            }

            let body = response.bytes().await.map_err(ProbeError::Body)?;
            let report: MetricsReport =
                serde_json::from_slice(&body).map_err(ProbeError::Decode)?;

            debug!(
                "📥 Peer '{}' reported {}",
                endpoint.name,
                String::from_utf8_lossy(&body)
            );

            Ok(report.into_record(&endpoint.name))
        };

        tokio::time::timeout_at(deadline, fetch)
            .await
            .map_err(|_| ProbeError::DeadlineExceeded)?
    }
}

/// Build the metrics URL for an address that may or may not carry a port.
/// Bare IPv6 addresses are bracketed.
pub fn metrics_url(address: &str, path: &str) -> String {
    if address.parse::<Ipv6Addr>().is_ok() {
        format!("http://[{}]{}", address, path)
    } else {
        format!("http://{}{}", address, path)
    }
}
