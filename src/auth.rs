//! API key authentication.
//!
//! Every `/api/v1` request must carry the configured key in the `X-API-Key`
//! header. Comparison is constant-time so the key cannot be recovered byte by
//! byte from response timing.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::api::AppState;
use crate::error::ApiError;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time key comparison.
pub fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Middleware guarding the versioned API surface.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        None => Err(ApiError::MissingApiKey),
        Some(key) if keys_match(key, &state.config.api_key) => Ok(next.run(req).await),
        Some(_) => Err(ApiError::InvalidApiKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_keys_pass() {
        assert!(keys_match("secret-key", "secret-key"));
    }

    #[test]
    fn mismatched_keys_fail() {
        assert!(!keys_match("secret-key", "secret-kez"));
        assert!(!keys_match("short", "secret-key"));
        assert!(!keys_match("", "secret-key"));
    }
}
