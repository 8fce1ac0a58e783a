//! # Cart API Server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cart API Server                                  │
//! │                                                                         │
//! │  Client ───► HTTP (8080) ───► CartEngine ───► SQLite (WAL)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configured from the environment, see [`cart_api::ApiConfig`]. Log output
//! follows `RUST_LOG`.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cart_api::{app, ApiConfig, AppState};
use cartledger_db::{Database, DbConfig, EngineConfig};

const DEFAULT_LOG_FILTER: &str = "info,cartledger=debug,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting Cart API server...");

    let config = ApiConfig::load()?;
    info!(
        port = config.port,
        db_path = %config.database_path.display(),
        max_connections = config.db_max_connections,
        max_conflict_retries = config.max_conflict_retries,
        "Configuration loaded"
    );

    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await?;

    let state = AppState::new(
        db.clone(),
        EngineConfig::new().max_conflict_retries(config.max_conflict_retries),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
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
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
