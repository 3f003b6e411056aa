//! Unified error types for the search gateway.

use thiserror::Error;

/// Unified error type for startup and lifecycle failures.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Configuration loading error.
    #[error("configuration error: {0}")]
    Config(#[from] envy::Error),

    /// Configuration loaded but failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP client construction error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend never answered the readiness probe.
    #[error("backend unreachable after {attempts} attempts")]
    BackendUnavailable {
        /// Probes made before giving up.
        attempts: u32,
    },

    /// Metrics exporter could not be installed.
    #[error("metrics error: {0}")]
    Metrics(String),

    /// Server task failed while serving or draining.
    #[error("server error: {0}")]
    Server(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single search request against the backend.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Request never completed (connect, timeout, body read).
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with something other than 200.
    #[error("unexpected response code: {0}")]
    UnexpectedStatus(u16),

    /// Body was not a JSON document.
    #[error("failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Convenient Result type alias.
pub type Result<T> = std::result::Result<T, GatewayError>;
