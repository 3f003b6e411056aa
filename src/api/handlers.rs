//! HTTP API handlers.

use axum::extract::{RawQuery, State};
use axum::http::StatusCode;
use tracing::info;

use crate::backend::{OpenSearchClient, SearchQuery};

use super::envelope::{ApiResponse, Envelope};

/// Application state shared with handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Backend client, built once at startup.
    pub client: OpenSearchClient,
}

impl AppState {
    /// Create new app state.
    pub fn new(client: OpenSearchClient) -> Self {
        Self { client }
    }
}

/// Health check handler - always returns 200.
pub async fn health() -> ApiResponse {
    ApiResponse::ok(Envelope::message("API is healthy"))
}

/// Root handler - names the configured backend.
pub async fn root(State(state): State<AppState>) -> ApiResponse {
    ApiResponse::ok(Envelope::message(format!(
        "Connected to OpenSearch at {}",
        state.client.endpoint()
    )))
}

/// Search handler - forwards `q` to the backend as a match query.
/// The first `q` wins; repeated or malformed parameters are not rejected.
pub async fn search(State(state): State<AppState>, RawQuery(raw): RawQuery) -> ApiResponse {
    let Some(query) = SearchQuery::from_query_string(raw.as_deref()) else {
        return ApiResponse::error(StatusCode::BAD_REQUEST, "Query parameter 'q' is required");
    };

    let pretty = state
        .client
        .search(&query)
        .await
        .map_err(|e| e.to_string())
        .and_then(|results| results.pretty().map_err(|e| e.to_string()));

    match pretty {
        Ok(results) => {
            info!(query = %query, "Search completed");
            ApiResponse::ok(Envelope::Results {
                message: format!("Search results for query: '{query}'"),
                results,
            })
        }
        Err(cause) => ApiResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Search failed: {cause}"),
        ),
    }
}

/// Fallback for unknown routes.
pub async fn not_found() -> ApiResponse {
    ApiResponse::error(StatusCode::NOT_FOUND, "Not Found")
}
