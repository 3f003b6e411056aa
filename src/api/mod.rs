//! HTTP API module for health, status and search endpoints.

pub mod envelope;
pub mod handlers;
pub mod middleware;
pub mod routes;

pub use envelope::{encode, ApiResponse, Envelope};
pub use handlers::AppState;
pub use routes::create_router;
