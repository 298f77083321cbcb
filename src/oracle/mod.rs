//! Balance sources queried by the refresh cycle

pub mod rpc;

use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;

pub use rpc::RpcOracle;

/// Source of current account balances
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Fetch the current balance of `address`
    async fn fetch_balance(&self, address: Address) -> Result<U256, OracleError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("Invalid oracle URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}
