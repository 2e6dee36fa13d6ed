//! Bearer API key authentication for job routes

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use http::header;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::error::ApiError;
use crate::server::AppState;

/// Reject job requests without the configured bearer key
///
/// With no key configured every request passes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if validate_api_key(provided, state.api_key.as_deref()) {
        Ok(next.run(request).await)
    } else {
        warn!("Rejected request to {} with missing or wrong API key", request.uri().path());
        Err(ApiError::AuthFailed)
    }
}

/// Compare a provided key with the configured one
pub fn validate_api_key(provided: Option<&str>, expected: Option<&str>) -> bool {
    match (provided, expected) {
        (_, None) => true,
        (Some(p), Some(e)) => p.as_bytes().ct_eq(e.as_bytes()).into(),
        (None, Some(_)) => false,
    }
}
