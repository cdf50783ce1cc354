//! # Kubernetes Directory
//!
//! Lists the pods of a namespace through the cluster API:
//!
//! ```text
//! GET {api}/api/v1/namespaces/{namespace}/pods
//! Authorization: Bearer {service account token}
//! ```
//!
//! Each pod becomes a [`PeerEndpoint`] named after the pod, addressed by its pod IP.
//! Pods that have not been scheduled yet have no IP and map to `address: None`.

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::directory::{assert_namespace, PeerDirectory};
use crate::common::error::DirectoryError;
use crate::common::messages::PeerEndpoint;

/// Where the service account credentials are mounted inside a pod.
pub const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

#[derive(Debug, Deserialize)]
struct PodList {
    #[serde(default)]
    items: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    metadata: PodMetadata,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Deserialize)]
struct PodMetadata {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    #[serde(default, rename = "podIP")]
    pod_ip: Option<String>,
}

fn pod_endpoint(pod: Pod) -> PeerEndpoint {
    let address = pod.status.pod_ip.filter(|ip| !ip.is_empty());
    PeerEndpoint::new(pod.metadata.name, address)
}

/// Peer directory backed by the Kubernetes pod list.
pub struct KubernetesDirectory {
    /// API base URL, e.g. `https://10.96.0.1:443`
    api_base: String,
    /// Bearer token (empty for unauthenticated test servers)
    token: String,
    client: reqwest::Client,
    /// Bound on a single listing call
    timeout: Duration,
}

impl KubernetesDirectory {
    pub fn new(
        api_base: impl Into<String>,
        token: impl Into<String>,
        client: reqwest::Client,
        timeout: Duration,
    ) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
            timeout,
        }
    }

    /// Build a directory from the in-cluster environment: API host and port from
    /// `KUBERNETES_SERVICE_HOST`/`KUBERNETES_SERVICE_PORT`, token and CA bundle
    /// from the mounted service account.
    pub fn in_cluster(timeout: Duration) -> Result<Self, DirectoryError> {
        let host = std::env::var("KUBERNETES_SERVICE_HOST")
            .map_err(|_| DirectoryError::setup("KUBERNETES_SERVICE_HOST is not set"))?;
        let port = std::env::var("KUBERNETES_SERVICE_PORT")
            .map_err(|_| DirectoryError::setup("KUBERNETES_SERVICE_PORT is not set"))?;

        Self::from_service_account(&host, &port, Path::new(SERVICE_ACCOUNT_DIR), timeout)
    }

    /// Build a directory for the API at `host:port` with the `token` and `ca.crt`
    /// files found in `account`.
    pub fn from_service_account(
        host: &str,
        port: &str,
        account: &Path,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let token = fs::read_to_string(account.join("token"))
            .map_err(|e| DirectoryError::setup(format!("couldn't read service account token: {}", e)))?;
        let ca = fs::read(account.join("ca.crt"))
            .map_err(|e| DirectoryError::setup(format!("couldn't read cluster CA bundle: {}", e)))?;
        let certificate = reqwest::Certificate::from_pem(&ca)
            .map_err(|e| DirectoryError::setup(format!("invalid cluster CA bundle: {}", e)))?;

        let client = reqwest::Client::builder()
            .add_root_certificate(certificate)
            .build()
            .map_err(|e| DirectoryError::setup(format!("couldn't create http client: {}", e)))?;

        Ok(Self::new(api_base(host, port), token.trim(), client, timeout))
    }
}

/// `https://host:port`, bracketing IPv6 hosts.
fn api_base(host: &str, port: &str) -> String {
    if host.contains(':') {
        format!("https://[{}]:{}", host, port)
    } else {
        format!("https://{}:{}", host, port)
    }
}

#[async_trait]
impl PeerDirectory for KubernetesDirectory {
    async fn list_peers(&self, namespace: &str) -> Result<Vec<PeerEndpoint>, DirectoryError> {
        assert_namespace(namespace);

        let url = format!("{}/api/v1/namespaces/{}/pods", self.api_base, namespace);
        debug!("🔎 Fetching list of pods in namespace '{}'", namespace);

        let mut request = self.client.get(&url).timeout(self.timeout);
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::unavailable(format!("GET {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::unavailable(format!(
                "GET {} returned {}",
                url, status
            )));
        }

        let pods: PodList = response
            .json()
            .await
            .map_err(|e| DirectoryError::malformed(format!("couldn't decode pod list: {}", e)))?;

        Ok(pods.items.into_iter().map(pod_endpoint).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::net::SocketAddr;

    async fn spawn_api(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn directory(addr: SocketAddr) -> KubernetesDirectory {
        KubernetesDirectory::new(
            format!("http://{}", addr),
            "secret-token",
            reqwest::Client::new(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn test_api_base_brackets_ipv6() {
        assert_eq!(api_base("10.96.0.1", "443"), "https://10.96.0.1:443");
        assert_eq!(api_base("fd00::1", "443"), "https://[fd00::1]:443");
    }

    const TEST_CA: &str = include_str!("testdata/ca.crt");

    fn service_account(token: Option<&str>, ca: Option<&str>) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(token) = token {
            fs::write(dir.path().join("token"), token).unwrap();
        }
        if let Some(ca) = ca {
            fs::write(dir.path().join("ca.crt"), ca).unwrap();
        }
        dir
    }

    #[test]
    fn test_from_service_account() {
        let account = service_account(Some("  cluster-token\n"), Some(TEST_CA));

        let directory = KubernetesDirectory::from_service_account(
            "10.96.0.1",
            "443",
            account.path(),
            Duration::from_secs(3),
        )
        .unwrap();

        assert_eq!(directory.api_base, "https://10.96.0.1:443");
        assert_eq!(directory.token, "cluster-token");
        assert_eq!(directory.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_token_is_setup_error() {
        let account = service_account(None, Some(TEST_CA));

        let err = KubernetesDirectory::from_service_account(
            "10.96.0.1",
            "443",
            account.path(),
            Duration::from_secs(3),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DirectoryError::Setup { ref message } if message.contains("token")));
    }

    #[test]
    fn test_missing_ca_bundle_is_setup_error() {
        let account = service_account(Some("cluster-token"), None);

        let err = KubernetesDirectory::from_service_account(
            "fd00::1",
            "6443",
            account.path(),
            Duration::from_secs(3),
        )
        .err()
        .unwrap();
        assert!(matches!(err, DirectoryError::Setup { ref message } if message.contains("CA")));
    }

    #[tokio::test]
    async fn test_lists_pods_with_token() {
        let app = Router::new().route(
            "/api/v1/namespaces/bully/pods",
            get(|headers: HeaderMap| async move {
                let auth = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                if auth != "Bearer secret-token" {
                    return (StatusCode::UNAUTHORIZED, String::new());
                }
                (
                    StatusCode::OK,
                    r#"{"kind":"PodList","items":[
                        {"metadata":{"name":"bully-0"},"status":{"podIP":"10.0.0.10"}},
                        {"metadata":{"name":"bully-1"},"status":{"podIP":""}},
                        {"metadata":{"name":"bully-2"}}
                    ]}"#
                    .to_string(),
                )
            }),
        );
        let addr = spawn_api(app).await;

        let peers = directory(addr).list_peers("bully").await.unwrap();

        assert_eq!(
            peers,
            vec![
                PeerEndpoint::new("bully-0", Some("10.0.0.10".to_string())),
                PeerEndpoint::new("bully-1", None),
                PeerEndpoint::new("bully-2", None),
            ]
        );
    }

    #[tokio::test]
    async fn test_error_status_is_unavailable() {
        let app = Router::new().route(
            "/api/v1/namespaces/bully/pods",
            get(|| async { StatusCode::FORBIDDEN }),
        );
        let addr = spawn_api(app).await;

        let err = directory(addr).list_peers("bully").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_garbage_body_is_malformed() {
        let app = Router::new().route(
            "/api/v1/namespaces/bully/pods",
            get(|| async { "not json" }),
        );
        let addr = spawn_api(app).await;

        let err = directory(addr).list_peers("bully").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Malformed { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_api_is_unavailable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = directory(addr).list_peers("bully").await.unwrap_err();
        assert!(matches!(err, DirectoryError::Unavailable { .. }));
    }
}
