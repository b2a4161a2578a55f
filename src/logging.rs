use std::time::Instant;

use axum::{extract::Request, http::header, middleware::Next, response::Response};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// One summary event per HTTP exchange; severity follows the response status class.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_bytes = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0);
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = started_at.elapsed().as_millis();

    if response.status().is_server_error() {
        error!(%method, %path, status, request_bytes, duration_ms, "request failed");
    } else if response.status().is_client_error() {
        warn!(%method, %path, status, request_bytes, duration_ms, "request rejected");
    } else {
        info!(%method, %path, status, request_bytes, duration_ms, "request summary");
    }

    response
}
