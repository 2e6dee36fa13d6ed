//! Route definitions

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};

use crate::handlers::{health, run, runsync};
use crate::middleware::auth::auth_middleware;
use crate::server::AppState;

/// Create the API router
pub fn routes(state: AppState) -> Router<AppState> {
    let jobs = Router::new()
        .route("/run", post(run))
        .route("/runsync", post(runsync))
        .route_layer(from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check
        .route("/health", get(health))
        .merge(jobs)
}
