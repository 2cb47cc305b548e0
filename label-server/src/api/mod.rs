//! API route module
//!
//! # Structure
//!
//! - [`health`] - banner and health check
//! - [`labels`] - print jobs (`/print`, `/shipping`, `/packing`, `/image`, `/raw`)
//! - [`printer_profile`] - profile read/update and offset nudge
//! - [`maintenance`] - calibration prints and media control

pub mod health;
pub mod labels;
pub mod maintenance;
pub mod printer_profile;

use std::time::Instant;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use http::{HeaderName, HeaderValue};
use tower_http::cors::CorsLayer;

use crate::core::ServerState;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// HTTP request logging middleware
///
/// Tags every request with an `x-request-id` (generated when absent) and
/// echoes it on the response.
async fn log_request(
    mut request: http::Request<axum::body::Body>,
    next: middleware::Next,
) -> http::Response<axum::body::Body> {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = match request.headers().get(&REQUEST_ID) {
        Some(id) => id.clone(),
        None => {
            let id = HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
            request.headers_mut().insert(REQUEST_ID.clone(), id.clone());
            id
        }
    };

    let started = Instant::now();
    let mut response = next.run(request).await;
    let status = response.status();

    tracing::info!(
        target: "http_access",
        request_id = request_id.to_str().unwrap_or("-"),
        latency_ms = started.elapsed().as_millis() as u64,
        "{} {} {}",
        method,
        uri,
        status
    );

    response.headers_mut().insert(REQUEST_ID.clone(), request_id);
    response
}

/// Build the Axum router (without state)
pub fn build_app() -> Router<ServerState> {
    Router::<ServerState>::new()
        .merge(health::router())
        .merge(labels::router())
        .merge(printer_profile::router())
        .merge(maintenance::router())
}

/// Router bound to `state` with the standard middleware stack
pub fn build_router(state: ServerState) -> Router {
    let body_limit = state.config.max_raw_bytes.max(state.config.max_image_bytes);
    build_app()
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(middleware::from_fn(log_request))
}
