//! Command-line configuration
//!
//! Every flag can also be supplied through a `BALANCE_MONITOR_*` environment
//! variable.

use std::time::Duration;

use alloy_primitives::{Address, U256};
use clap::Parser;

use crate::api::ServerConfig;
use crate::monitor::parse_address;

/// Longest accepted refresh interval or fetch timeout, one week
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Clone, Parser)]
#[command(name = "balance-monitor", version, about = "Serve health of monitored account balances")]
pub struct Args {
    /// URL of the Ethereum JSON-RPC node
    #[arg(long, env = "BALANCE_MONITOR_URL", default_value = "http://localhost:8545")]
    pub url: String,

    /// Address to bind the HTTP server to
    #[arg(long, env = "BALANCE_MONITOR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port for the HTTP server
    #[arg(long = "http-port", env = "BALANCE_MONITOR_HTTP_PORT", default_value_t = 8080)]
    pub http_port: u16,

    /// Seconds between balance updates
    #[arg(long, env = "BALANCE_MONITOR_INTERVAL", default_value_t = 60)]
    pub interval: u64,

    /// Seconds before a single balance fetch is abandoned (default: half the interval)
    #[arg(long = "fetch-timeout", env = "BALANCE_MONITOR_FETCH_TIMEOUT")]
    pub fetch_timeout: Option<u64>,

    /// Comma-separated list of accounts in the format <address>:<minimum balance (wei)>
    #[arg(long, env = "BALANCE_MONITOR_ACCOUNTS", value_parser = parse_accounts)]
    pub accounts: AccountList,
}

/// Parsed `<address>:<minimum>` pairs, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountList(pub Vec<(Address, U256)>);

impl Args {
    /// Validate the arguments and turn them into a server configuration
    pub fn into_server_config(self) -> Result<ServerConfig, ConfigError> {
        if self.interval == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.interval > MAX_INTERVAL_SECS {
            return Err(ConfigError::IntervalTooLarge(self.interval));
        }
        let update_interval = Duration::from_secs(self.interval);

        let fetch_timeout = match self.fetch_timeout {
            Some(0) => return Err(ConfigError::ZeroFetchTimeout),
            Some(secs) if secs > MAX_INTERVAL_SECS => {
                return Err(ConfigError::FetchTimeoutTooLarge(secs))
            }
            Some(secs) => Duration::from_secs(secs),
            None => update_interval / 2,
        };

        if self.accounts.0.is_empty() {
            return Err(ConfigError::NoAccounts);
        }

        Ok(ServerConfig {
            host: self.host,
            port: self.http_port,
            rpc_url: self.url,
            update_interval,
            fetch_timeout,
            accounts: self.accounts.0,
        })
    }
}

/// Parse `<address>:<minimum>[,<address>:<minimum>...]`.
///
/// Minimums are base-10 integers in wei.
pub fn parse_accounts(value: &str) -> Result<AccountList, ConfigError> {
    let mut accounts = Vec::new();

    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (address, minimum) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::MissingMinimum(entry.to_string()))?;

        let address =
            parse_address(address).map_err(|_| ConfigError::InvalidAddress(address.to_string()))?;
        let minimum = parse_minimum(minimum)?;

        accounts.push((address, minimum));
    }

    if accounts.is_empty() {
        return Err(ConfigError::NoAccounts);
    }

    Ok(AccountList(accounts))
}

fn parse_minimum(value: &str) -> Result<U256, ConfigError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ConfigError::InvalidMinimum(value.to_string()));
    }

    U256::from_str_radix(value, 10).map_err(|_| ConfigError::InvalidMinimum(value.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("must provide at least one account")]
    NoAccounts,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid minimum balance: {0}")]
    InvalidMinimum(String),

    #[error("missing minimum balance for account: {0}")]
    MissingMinimum(String),

    #[error("interval must be at least one second")]
    ZeroInterval,

    #[error("fetch timeout must be at least one second")]
    ZeroFetchTimeout,

    #[error("interval of {0} seconds exceeds the maximum of {max}", max = MAX_INTERVAL_SECS)]
    IntervalTooLarge(u64),

    #[error("fetch timeout of {0} seconds exceeds the maximum of {max}", max = MAX_INTERVAL_SECS)]
    FetchTimeoutTooLarge(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";

    #[test]
    fn test_parse_accounts() {
        let list = parse_accounts(&format!("{}:100,{}:2000000000000000000", A, B)).unwrap();
        assert_eq!(
            list.0,
            vec![
                (Address::repeat_byte(0xaa), U256::from(100)),
                (
                    Address::repeat_byte(0xbb),
                    U256::from(2_000_000_000_000_000_000u128)
                ),
            ]
        );
    }

    #[test]
    fn test_parse_accounts_large_minimum() {
        let max = U256::MAX.to_string();
        let list = parse_accounts(&format!("{}:{}", A, max)).unwrap();
        assert_eq!(list.0[0].1, U256::MAX);
    }

    #[test]
    fn test_parse_accounts_errors() {
        assert!(matches!(
            parse_accounts("0x1234:100"),
            Err(ConfigError::InvalidAddress(_))
        ));
        assert!(matches!(
            parse_accounts(A),
            Err(ConfigError::MissingMinimum(_))
        ));
        assert!(matches!(
            parse_accounts(&format!("{}:", A)),
            Err(ConfigError::InvalidMinimum(_))
        ));
        assert!(matches!(
            parse_accounts(&format!("{}:-5", A)),
            Err(ConfigError::InvalidMinimum(_))
        ));
        assert!(matches!(
            parse_accounts(&format!("{}:0x10", A)),
            Err(ConfigError::InvalidMinimum(_))
        ));
        assert!(matches!(parse_accounts(""), Err(ConfigError::NoAccounts)));
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from([
            "balance-monitor",
            "--accounts",
            format!("{}:1", A).as_str(),
        ])
        .unwrap();

        let config = args.into_server_config().unwrap();
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.port, 8080);
        assert_eq!(config.update_interval, Duration::from_secs(60));
        assert_eq!(config.fetch_timeout, Duration::from_secs(30));
        assert_eq!(config.accounts.len(), 1);
    }

    #[test]
    fn test_args_overrides() {
        let args = Args::try_parse_from([
            "balance-monitor",
            "--url",
            "http://node:8545",
            "--http-port",
            "9000",
            "--interval",
            "5",
            "--fetch-timeout",
            "2",
            "--accounts",
            format!("{}:1,{}:2", A, B).as_str(),
        ])
        .unwrap();

        let config = args.into_server_config().unwrap();
        assert_eq!(config.rpc_url, "http://node:8545");
        assert_eq!(config.port, 9000);
        assert_eq!(config.update_interval, Duration::from_secs(5));
        assert_eq!(config.fetch_timeout, Duration::from_secs(2));
        assert_eq!(config.accounts.len(), 2);
    }

    #[test]
    fn test_args_zero_interval_rejected() {
        let args = Args::try_parse_from([
            "balance-monitor",
            "--interval",
            "0",
            "--accounts",
            format!("{}:1", A).as_str(),
        ])
        .unwrap();

        assert!(matches!(
            args.into_server_config(),
            Err(ConfigError::ZeroInterval)
        ));
    }

    #[test]
    fn test_args_oversized_durations_rejected() {
        let accounts = format!("{}:1", A);
        let max = u64::MAX.to_string();

        let args = Args::try_parse_from([
            "balance-monitor",
            "--interval",
            max.as_str(),
            "--accounts",
            accounts.as_str(),
        ])
        .unwrap();
        assert!(matches!(
            args.into_server_config(),
            Err(ConfigError::IntervalTooLarge(u64::MAX))
        ));

        let args = Args::try_parse_from([
            "balance-monitor",
            "--fetch-timeout",
            max.as_str(),
            "--accounts",
            accounts.as_str(),
        ])
        .unwrap();
        assert!(matches!(
            args.into_server_config(),
            Err(ConfigError::FetchTimeoutTooLarge(u64::MAX))
        ));
    }

    #[test]
    fn test_args_longest_interval_accepted() {
        let accounts = format!("{}:1", A);
        let max = MAX_INTERVAL_SECS.to_string();

        let config = Args::try_parse_from([
            "balance-monitor",
            "--interval",
            max.as_str(),
            "--accounts",
            accounts.as_str(),
        ])
        .unwrap()
        .into_server_config()
        .unwrap();

        assert_eq!(config.update_interval, Duration::from_secs(MAX_INTERVAL_SECS));
        assert_eq!(config.fetch_timeout, Duration::from_secs(MAX_INTERVAL_SECS / 2));
    }

    #[test]
    fn test_args_bad_accounts_rejected() {
        let result = Args::try_parse_from(["balance-monitor", "--accounts", "nope:1"]);
        assert!(result.is_err());
    }
}
