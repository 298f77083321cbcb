//! Balance Monitor: HTTP health probe for funded accounts
//!
//! Periodically reads the balance of a fixed set of accounts from an
//! Ethereum JSON-RPC node and serves one status per address:
//!
//! - `GET /balances/<address>` returns `200` with the decimal balance while
//!   the balance is above the account's minimum, `500` with the balance once
//!   it drops to or below it, and `404` for malformed or untracked addresses.
//!
//! # Example
//!
//! ```no_run
//! use alloy_primitives::{Address, U256};
//! use balance_monitor::monitor::AccountStore;
//!
//! let address = Address::repeat_byte(0xaa);
//! let store = AccountStore::new([(address, U256::from(100))]).unwrap();
//!
//! store.record_balance(&address, U256::from(100)).unwrap();
//! assert!(!store.status(&address).unwrap().is_healthy());
//! ```

pub mod api;
pub mod config;
pub mod monitor;
pub mod oracle;

// Re-export commonly used types
pub use api::{run_server, ServerConfig};
pub use monitor::{Account, AccountStore, RefreshWorker};
pub use oracle::{BalanceOracle, OracleError, RpcOracle};
