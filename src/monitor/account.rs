use std::str::FromStr;

use alloy_primitives::{Address, U256};
use chrono::{DateTime, Utc};

/// Monitored account state
///
/// `healthy` is only ever written together with `balance`, so a copy of an
/// `Account` always carries a health flag that matches its own balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    balance: U256,
    minimum_balance: U256,
    healthy: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl Account {
    /// Create an account that has not been fetched yet.
    ///
    /// Accounts start out healthy with a zero balance until the first
    /// refresh cycle reports otherwise.
    pub fn new(minimum_balance: U256) -> Self {
        Self {
            balance: U256::ZERO,
            minimum_balance,
            healthy: true,
            last_updated: None,
        }
    }

    /// Record a freshly fetched balance and recompute health
    pub fn record(&mut self, balance: U256, at: DateTime<Utc>) -> bool {
        self.balance = balance;
        self.healthy = is_healthy(balance, self.minimum_balance);
        self.last_updated = Some(at);
        self.healthy
    }

    pub fn balance(&self) -> U256 {
        self.balance
    }

    pub fn minimum_balance(&self) -> U256 {
        self.minimum_balance
    }

    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Time of the last successful fetch, `None` before the first one
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}

/// A balance exactly at the minimum counts as low.
pub fn is_healthy(balance: U256, minimum_balance: U256) -> bool {
    balance > minimum_balance
}

/// Error returned for strings that are not a hex-encoded 20-byte address
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address: {0}")]
pub struct InvalidAddress(pub String);

/// Parse a hex address, with or without a `0x` prefix, in any letter case.
///
/// Checksums are not enforced.
pub fn parse_address(input: &str) -> Result<Address, InvalidAddress> {
    let hex = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);

    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(InvalidAddress(input.to_string()));
    }

    Address::from_str(hex).map_err(|_| InvalidAddress(input.to_string()))
}
