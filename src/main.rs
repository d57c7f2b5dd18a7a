//! Model Router - main entry point
//!
//! Loads the pool file, binds the listener and serves until interrupted.

use anyhow::{Context, Result};
use clap::Parser;
use model_router::{build_router, core::init_tracing, serve, AppState, RouterConfig, ServeOutcome};
use std::sync::Arc;
use std::time::Duration;

/// In-flight requests get this long to finish after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Parser)]
#[command(name = "model-router", version, about = "Model-aware router for inference pools")]
struct Args {
    /// Path to the pool configuration file
    #[arg(long, env = "ROUTER_CONFIG", default_value = "pools.yaml")]
    config: String,

    /// host:port to listen on
    #[arg(long, env = "ROUTER_LISTEN", default_value = "0.0.0.0:9090")]
    listen: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads env fallbacks
    dotenvy::dotenv().ok();
    let args = Args::parse();

    init_tracing();

    let config = RouterConfig::load(&args.config)
        .with_context(|| format!("failed to load pool config from {}", args.config))?;
    tracing::info!(
        pools = config.pools.len(),
        endpoints = config.endpoint_count(),
        "Configuration loaded from {}",
        args.config
    );

    let state = AppState::from_config(&config).context("failed to build HTTP client")?;
    state.routing.log_pools();
    let app = build_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("failed to bind {}", args.listen))?;
    tracing::info!("Router started on {}", args.listen);

    let outcome = serve(listener, app, shutdown_signal(), SHUTDOWN_GRACE)
        .await
        .context("server error")?;
    if outcome == ServeOutcome::ForcedAfterGrace {
        tracing::warn!(
            grace_secs = SHUTDOWN_GRACE.as_secs(),
            "Connections still open after grace period were terminated"
        );
    }

    Ok(())
}

/// Resolve on Ctrl-C, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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
