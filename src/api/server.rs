use alloy_primitives::{Address, U256};
use axum::{routing::get, Router};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use super::handlers::{fallback, get_balance, health_check, AppState};
use crate::monitor::{AccountStore, RefreshWorker};
use crate::oracle::{BalanceOracle, RpcOracle};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// JSON-RPC endpoint of the node balances are read from
    pub rpc_url: String,
    pub update_interval: Duration,
    pub fetch_timeout: Duration,
    pub accounts: Vec<(Address, U256)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rpc_url: "http://localhost:8545".to_string(),
            update_interval: Duration::from_secs(60),
            fetch_timeout: Duration::from_secs(30),
            accounts: Vec::new(),
        }
    }
}

/// Build the application router
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Per-account status
        .route("/balances/:address", get(get_balance))
        // Trailing slashes, extra segments and missing addresses
        .fallback(fallback)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the monitor against the configured JSON-RPC node
pub async fn run_server(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    let oracle = Arc::new(RpcOracle::with_timeout(&config.rpc_url, config.fetch_timeout)?);
    tracing::info!("Using balance oracle at {}", oracle.url());

    serve(config, oracle).await
}

/// Run the monitor with any balance oracle
pub async fn serve(
    config: ServerConfig,
    oracle: Arc<dyn BalanceOracle>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(AccountStore::new(config.accounts.iter().copied())?);

    for address in store.addresses() {
        if let Some(account) = store.status(&address) {
            tracing::info!(
                address = %address,
                minimum = %account.minimum_balance(),
                "Monitoring account"
            );
        }
    }

    let worker = Arc::new(RefreshWorker::new(
        Arc::clone(&store),
        oracle,
        config.update_interval,
        config.fetch_timeout,
    ));

    // Fetch balances once before serving requests
    worker.run_cycle().await;
    let mut refresh_handle = Arc::clone(&worker).start();

    let state = Arc::new(AppState { store });
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    tracing::info!("Starting balance monitor on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

    // The refresh worker must outlive the server; stale balances are never served
    tokio::select! {
        result = server.into_future() => {
            result?;
        }
        result = &mut refresh_handle => {
            if let Err(e) = result {
                tracing::error!("Refresh worker ended abnormally: {}", e);
            }
            return Err(ServerError::RefreshWorkerStopped.into());
        }
    }

    worker.stop();
    if let Err(e) = refresh_handle.await {
        tracing::warn!("Refresh worker ended abnormally: {}", e);
    }

    tracing::info!("Balance monitor stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install CTRL+C signal handler: {}", e);
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutdown signal received, stopping...");
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("refresh worker stopped while serving")]
    RefreshWorkerStopped,
}
