//! Minimal HTTP gateway in front of an OpenSearch document index.
//!
//! The gateway exposes three read-only endpoints and forwards searches to
//! the backend as a single `match` query:
//!
//! ```text
//! GET /health        -> {"message":"API is healthy"}
//! GET /              -> {"message":"Connected to OpenSearch at <url>"}
//! GET /search?q=foo  -> {"message":"Search results for query: 'foo'","error":"<results>"}
//! ```
//!
//! Serving starts only once the backend answers its info probe.
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`backend`]: OpenSearch client and query body
//! - [`readiness`]: Startup probe with backoff
//! - [`api`]: Routes, handlers, middleware and the response envelope
//! - [`server`]: Listener lifecycle and graceful shutdown
//! - [`shutdown`]: Signal handling
//! - [`metrics`]: Prometheus metrics

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod metrics;
pub mod readiness;
pub mod server;
pub mod shutdown;

pub use config::Config;
pub use error::{GatewayError, Result};
pub use server::{Application, ServerPhase};
