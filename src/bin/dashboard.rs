//! # Dashboard Binary Entry Point
//!
//! Observes a bully-election group and serves its current view over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! TARGET_NAMESPACE=bully cargo run --bin dashboard
//! cargo run --bin dashboard -- --config config/dashboard.toml
//! ```
//!
//! The dashboard will:
//! 1. Load configuration (file, then environment); exit non-zero if the namespace is missing
//! 2. Build the peer directory (Kubernetes in-cluster or static list)
//! 3. Start the poll loop in the background
//! 4. Serve `/` and `/api` until SIGINT/SIGTERM, then drain in-flight requests

use anyhow::Context;
use clap::Parser;
use env_logger::Builder;
use log::{error, info, warn, LevelFilter};
use std::io::Write;
use std::sync::Arc;
use tokio::sync::watch;

use election_dashboard::collect::{Collector, PeerProber};
use election_dashboard::common::config::{DashboardConfig, DirectoryKind};
use election_dashboard::discovery::{KubernetesDirectory, PeerDirectory, StaticDirectory};
use election_dashboard::server::{router, AppState, PollLoop, UiPage};
use election_dashboard::state::SnapshotStore;

/// Command-line arguments for the dashboard binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional configuration file (TOML). Environment variables override it.
    #[arg(short, long)]
    config: Option<String>,
}

/// Initialize logging with a `[HH:MM:SS] [LEVEL] message` format.
///
/// INFO by default, DEBUG when `DEVELOPMENT` is set. `RUST_LOG` overrides both.
fn init_logger() {
    let development = std::env::var("DEVELOPMENT").is_ok_and(|value| !value.is_empty());
    let level = if development {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(level)
        .parse_default_env()
        .init();
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Couldn't listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("❌ Couldn't listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let config = DashboardConfig::load(args.config.as_deref()).context("invalid configuration")?;
    let namespace = config.dashboard.namespace.clone();

    let directory: Arc<dyn PeerDirectory> = match config.directory.kind {
        DirectoryKind::Kubernetes => Arc::new(
            KubernetesDirectory::in_cluster(config.collection.timeout())
                .context("couldn't create kubernetes directory")?,
        ),
        DirectoryKind::Static => Arc::new(StaticDirectory::new(config.directory.endpoints())),
    };

    let prober = PeerProber::new(reqwest::Client::new(), config.collection.metrics_path.clone());
    let collector = Arc::new(Collector::new(
        namespace.clone(),
        config.collection.timeout(),
        directory,
        prober,
    ));
    let store = Arc::new(SnapshotStore::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Background polling
    let poller = PollLoop::new(
        collector,
        Arc::clone(&store),
        config.collection.poll_interval(),
    );
    let poll_shutdown = shutdown_rx.clone();
    let poll_task = tokio::spawn(async move { poller.run(poll_shutdown).await });

    // HTTP server
    let app = router(AppState::new(store, UiPage::new(&namespace)));
    let listener = tokio::net::TcpListener::bind(&config.dashboard.bind_address)
        .await
        .with_context(|| format!("couldn't bind {}", config.dashboard.bind_address))?;

    info!(
        "🌐 Dashboard for namespace '{}' listening on http://{}",
        namespace, config.dashboard.bind_address
    );

    let mut server_shutdown = shutdown_rx;
    let mut server_task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.changed().await;
            })
            .await
    });

    tokio::select! {
        result = &mut server_task => {
            let _ = shutdown_tx.send(true);
            result.context("server task panicked")?.context("server failed")?;
            anyhow::bail!("server stopped unexpectedly");
        }
        _ = shutdown_signal() => {
            info!("🛑 Shutdown signal received, draining requests...");
        }
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(config.shutdown.grace(), server_task).await {
        Ok(result) => {
            result.context("server task panicked")?.context("server shutdown failed")?;
        }
        Err(_) => {
            warn!(
                "⚠️  In-flight requests did not drain within {:?}",
                config.shutdown.grace()
            );
        }
    }

    if let Err(e) = poll_task.await {
        error!("❌ Poll loop task failed: {}", e);
    }

    info!("👋 Dashboard stopped");

    Ok(())
}
