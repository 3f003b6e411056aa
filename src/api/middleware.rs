//! Middleware for the gateway API.
//!
//! Provides request logging and metrics, the per-request timeout, and the
//! panic boundary.

use std::any::Any;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};

use crate::metrics;

use super::envelope::{encode, Envelope};

/// Request logging middleware
///
/// Logs every request with method, URI, status code and duration, and
/// records request metrics labelled by the matched route.
pub async fn track_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = Instant::now();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();
    metrics::record_http_request(start, &path, status.as_u16());

    if status.is_server_error() {
        error!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration_ms,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            duration_ms = %duration_ms,
            "Request completed"
        );
    }

    response
}

/// Abort the request and answer 504 once `limit` elapses.
///
/// The handler future is dropped, which also drops any backend call it
/// was awaiting.
pub async fn enforce_timeout(
    State(limit): State<Duration>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let uri = request.uri().clone();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            metrics::inc_request_timeouts();
            warn!(uri = %uri, limit_ms = limit.as_millis() as u64, "Request timed out");
            encode(StatusCode::GATEWAY_TIMEOUT, &Envelope::error("Request timed out"))
        }
    }
}

/// Turn a handler panic into a 500 envelope.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    };

    metrics::inc_handler_panics();
    error!(panic = %detail, "Handler panicked");

    encode(
        StatusCode::INTERNAL_SERVER_ERROR,
        &Envelope::error("Internal Server Error"),
    )
}
