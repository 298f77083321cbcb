use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;

use super::{BalanceOracle, OracleError};

/// Balance oracle backed by an Ethereum JSON-RPC node (`eth_getBalance`)
#[derive(Debug)]
pub struct RpcOracle {
    http_client: reqwest::Client,
    url: reqwest::Url,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

impl RpcOracle {
    /// Create an oracle whose HTTP requests give up after `timeout`
    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, OracleError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| OracleError::InvalidUrl(format!("{}: {}", url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(OracleError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                url,
                url.scheme()
            )));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

#[async_trait]
impl BalanceOracle for RpcOracle {
    async fn fetch_balance(&self, address: Address) -> Result<U256, OracleError> {
        let request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
            "method": "eth_getBalance",
            "params": [address.to_string(), "latest"],
        });

        let response = self
            .http_client
            .post(self.url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(OracleError::Network(format!("HTTP {}: {}", status, error_text)));
        }

        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))?;

        if let Some(error) = body.error {
            return Err(OracleError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        let result = body
            .result
            .ok_or_else(|| OracleError::InvalidResponse("missing result".to_string()))?;

        parse_quantity(&result)
    }
}

/// Decode a JSON-RPC hex quantity such as `0x1bc16d674ec80000`
pub fn parse_quantity(quantity: &str) -> Result<U256, OracleError> {
    let digits = quantity
        .strip_prefix("0x")
        .filter(|d| !d.is_empty() && d.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| OracleError::InvalidResponse(format!("bad quantity '{}'", quantity)))?;

    U256::from_str_radix(digits, 16)
        .map_err(|e| OracleError::InvalidResponse(format!("bad quantity '{}': {}", quantity, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use tokio::net::TcpListener;

    const TIMEOUT: Duration = Duration::from_secs(5);

    /// Spawn a JSON-RPC stub that answers every request with `reply`
    async fn spawn_node(reply: serde_json::Value) -> String {
        let app = Router::new().route(
            "/",
            post(move |Json(request): Json<serde_json::Value>| {
                let mut reply = reply.clone();
                reply["id"] = request["id"].clone();
                assert_eq!(request["method"], "eth_getBalance");
                async move { Json(reply) }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/", addr)
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("0x0").unwrap(), U256::ZERO);
        assert_eq!(parse_quantity("0x64").unwrap(), U256::from(100));
        assert_eq!(
            parse_quantity("0x1bc16d674ec80000").unwrap(),
            U256::from(2_000_000_000_000_000_000u128)
        );
        assert!(parse_quantity("0x").is_err());
        assert!(parse_quantity("64").is_err());
        assert!(parse_quantity("0xzz").is_err());
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            RpcOracle::with_timeout("not a url", TIMEOUT),
            Err(OracleError::InvalidUrl(_))
        ));
        assert!(matches!(
            RpcOracle::with_timeout("ftp://localhost:8545", TIMEOUT),
            Err(OracleError::InvalidUrl(_))
        ));
        assert!(RpcOracle::with_timeout("http://localhost:8545", TIMEOUT).is_ok());
    }

    #[tokio::test]
    async fn test_fetch_balance() {
        let url = spawn_node(serde_json::json!({
            "jsonrpc": "2.0",
            "result": "0x65"
        }))
        .await;

        let oracle = RpcOracle::with_timeout(&url, TIMEOUT).unwrap();
        let balance = oracle
            .fetch_balance(Address::repeat_byte(0xaa))
            .await
            .unwrap();

        assert_eq!(balance, U256::from(101));
    }

    #[tokio::test]
    async fn test_fetch_balance_rpc_error() {
        let url = spawn_node(serde_json::json!({
            "jsonrpc": "2.0",
            "error": { "code": -32000, "message": "header not found" }
        }))
        .await;

        let oracle = RpcOracle::with_timeout(&url, TIMEOUT).unwrap();
        let err = oracle
            .fetch_balance(Address::repeat_byte(0xaa))
            .await
            .unwrap_err();

        match err {
            OracleError::Rpc { code, message } => {
                assert_eq!(code, -32000);
                assert_eq!(message, "header not found");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_balance_unreachable() {
        // Bind then drop to get a port nobody is listening on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let oracle = RpcOracle::with_timeout(&format!("http://{}", addr), TIMEOUT).unwrap();
        let err = oracle
            .fetch_balance(Address::repeat_byte(0xaa))
            .await
            .unwrap_err();

        assert!(matches!(err, OracleError::Network(_)));
    }
}
