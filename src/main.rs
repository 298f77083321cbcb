//! Balance Monitor Server
//!
//! Run with: cargo run -- --accounts <address>:<minimum>[,...]
//!
//! Flags (each also read from the environment):
//! - --url / BALANCE_MONITOR_URL: JSON-RPC node (default: http://localhost:8545)
//! - --host / BALANCE_MONITOR_HOST: Bind address (default: 0.0.0.0)
//! - --http-port / BALANCE_MONITOR_HTTP_PORT: Port number (default: 8080)
//! - --interval / BALANCE_MONITOR_INTERVAL: Seconds between updates (default: 60)
//! - --fetch-timeout / BALANCE_MONITOR_FETCH_TIMEOUT: Per-fetch timeout in seconds
//! - --accounts / BALANCE_MONITOR_ACCOUNTS: Accounts to monitor (required)
//! - RUST_LOG: Log level (default: info)

use balance_monitor::api::run_server;
use balance_monitor::config::Args;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "balance_monitor=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = match args.into_server_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!("Balance monitor configuration:");
    tracing::info!("  Listen: {}:{}", config.host, config.port);
    tracing::info!("  RPC URL: {}", config.rpc_url);
    tracing::info!("  Update interval: {:?}", config.update_interval);
    tracing::info!("  Fetch timeout: {:?}", config.fetch_timeout);
    tracing::info!("  Accounts: {}", config.accounts.len());

    run_server(config).await
}
