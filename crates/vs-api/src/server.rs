//! HTTP job-runner server

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use vs_core::ApiConfig;
use vs_handler::Dispatcher;

use crate::error::Result;
use crate::routes::routes;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, api_key: Option<String>) -> Self {
        Self {
            dispatcher,
            api_key: api_key.map(Arc::from),
        }
    }
}

/// Build the application router
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .merge(routes(state.clone()))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP job-runner server
pub async fn start_server(config: &ApiConfig, dispatcher: Dispatcher) -> Result<()> {
    if config.key.is_none() {
        info!("No API_KEY configured; job routes are unauthenticated");
    }

    let state = AppState::new(dispatcher, config.key.clone());
    let app = router(state, config.max_body_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Job runner listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
