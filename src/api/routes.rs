//! HTTP API route definitions.

use std::time::Duration;

use axum::{middleware, routing::get, Router};
use tower::ServiceBuilder;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use super::handlers::{health, not_found, root, search, AppState};
use super::middleware::{enforce_timeout, handle_panic, track_request};

/// Create the API router.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/", get(root))
        .route("/search", get(search))
        .fallback(not_found)
        .with_state(state);

    with_middleware(router, request_timeout)
}

/// Wrap every route with tracing, request metrics, the panic boundary and
/// the request timeout, outermost first.
pub fn with_middleware(router: Router, request_timeout: Duration) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(middleware::from_fn(track_request))
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(middleware::from_fn_with_state(
                request_timeout,
                enforce_timeout,
            )),
    )
}
