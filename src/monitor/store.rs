use std::collections::HashMap;

use alloy_primitives::{Address, U256};
use parking_lot::RwLock;

use super::account::Account;
use crate::oracle::OracleError;

/// Concurrent store of monitored accounts
///
/// The address set is fixed at construction. Each account sits behind its
/// own lock, so readers of one address never wait on updates to another.
pub struct AccountStore {
    accounts: HashMap<Address, RwLock<Account>>,
}

/// Outcome of applying one refresh cycle's fetch results
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: usize,
    pub unhealthy: usize,
    pub failed: usize,
}

impl AccountStore {
    /// Build the store from `(address, minimum)` pairs.
    ///
    /// A repeated address keeps the last minimum given for it.
    pub fn new(
        accounts: impl IntoIterator<Item = (Address, U256)>,
    ) -> Result<Self, StoreError> {
        let accounts: HashMap<_, _> = accounts
            .into_iter()
            .map(|(address, minimum)| (address, RwLock::new(Account::new(minimum))))
            .collect();

        if accounts.is_empty() {
            return Err(StoreError::NoAccounts);
        }

        Ok(Self { accounts })
    }

    /// Number of tracked accounts
    pub(crate) fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Tracked addresses, sorted
    pub fn addresses(&self) -> Vec<Address> {
        let mut addresses: Vec<Address> = self.accounts.keys().copied().collect();
        addresses.sort();
        addresses
    }

    /// Snapshot of one account, or `None` if the address is not tracked
    pub fn status(&self, address: &Address) -> Option<Account> {
        self.accounts.get(address).map(|account| account.read().clone())
    }

    /// Record a fetched balance for one account and return the updated snapshot
    pub fn record_balance(&self, address: &Address, balance: U256) -> Result<Account, StoreError> {
        let account = self
            .accounts
            .get(address)
            .ok_or(StoreError::UnknownAddress(*address))?;

        let mut account = account.write();
        account.record(balance, chrono::Utc::now());
        Ok(account.clone())
    }

    /// Apply one cycle of fetch results.
    ///
    /// Accounts are updated one at a time. A failed fetch leaves its account
    /// untouched and does not affect the others.
    pub fn update_all(
        &self,
        results: impl IntoIterator<Item = (Address, Result<U256, OracleError>)>,
    ) -> UpdateSummary {
        let mut summary = UpdateSummary::default();

        for (address, result) in results {
            let balance = match result {
                Ok(balance) => balance,
                Err(_) => {
                    summary.failed += 1;
                    continue;
                }
            };

            match self.record_balance(&address, balance) {
                Ok(account) if account.is_healthy() => {
                    summary.updated += 1;
                    tracing::info!(
                        address = %address,
                        balance = %balance,
                        "Account has a healthy balance"
                    );
                }
                Ok(account) => {
                    summary.updated += 1;
                    summary.unhealthy += 1;
                    tracing::warn!(
                        address = %address,
                        balance = %balance,
                        minimum = %account.minimum_balance(),
                        "Account has low balance"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::warn!("Dropping fetched balance: {}", e);
                }
            }
        }

        summary
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no accounts to monitor")]
    NoAccounts,

    #[error("unknown address: {0}")]
    UnknownAddress(Address),
}
