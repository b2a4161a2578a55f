use std::{sync::Arc, time::Instant};

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

pub mod archive_client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;

use crate::http::handlers::{HEALTH_PATH, MCP_PATH};
use crate::mcp::server::Dispatcher;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            started_at: Instant::now(),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(
            MCP_PATH,
            post(http::handlers::mcp_endpoint).get(http::handlers::usage),
        )
        .route(HEALTH_PATH, get(http::handlers::health))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
