use axum::{
    extract::{Path, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::monitor::{parse_address, AccountStore};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<AccountStore>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub accounts: usize,
}

/// Liveness of the monitor itself, independent of any account's health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        accounts: state.store.len(),
    })
}

// ============================================================================
// Balances
// ============================================================================

/// `GET /balances/:address`
///
/// Responds 200 for a healthy account and 500 for one at or below its
/// minimum; both carry the decimal balance as a plain-text body.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Response, ApiError> {
    balance_response(&state, &address)
}

/// Fallback for paths the router cannot match.
///
/// Under `/balances` the last non-empty segment is taken as the address, so
/// `/balances/<address>/` resolves like `/balances/<address>` and `/balances/`
/// reports an invalid address. Anything else is a bare 404.
pub async fn fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let rest = match uri.path().strip_prefix("/balances") {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return StatusCode::NOT_FOUND.into_response(),
    };

    let address = rest.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
    balance_response(&state, address).into_response()
}

fn balance_response(state: &AppState, address: &str) -> Result<Response, ApiError> {
    let address = parse_address(address).map_err(|_| ApiError::InvalidAddress)?;

    let account = state
        .store
        .status(&address)
        .ok_or(ApiError::UnknownAddress)?;

    let status = if account.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, account.balance().to_string()).into_response())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    InvalidAddress,
    UnknownAddress,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::InvalidAddress => "invalid address",
            ApiError::UnknownAddress => "unknown address",
        };

        (StatusCode::NOT_FOUND, message).into_response()
    }
}
