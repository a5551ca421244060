//! Shared API key authentication
//!
//! A single key for the whole service; there are no per-user accounts.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{error::ApiError, AppState};

/// Header carrying the key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Reject requests without the configured key. No key configured means open.
pub async fn api_key_auth(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!("Invalid API key provided");
            Err(ApiError::Unauthorized)
        }
        None => {
            tracing::debug!("No API key provided in {} header", API_KEY_HEADER);
            Err(ApiError::Unauthorized)
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
