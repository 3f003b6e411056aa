//! OpenSearch HTTP client wrapper.

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{BackendEndpoint, Config};
use crate::error::{GatewayError, SearchError};
use crate::metrics;

use super::query::{SearchBody, SearchQuery};

/// Client for the single index the gateway fronts.
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OpenSearchClient {
    /// HTTP client for backend requests.
    http: reqwest::Client,
    /// Backend base URL.
    endpoint: BackendEndpoint,
    /// Index searched by `search`.
    index: String,
    /// Field the match query targets.
    field: String,
}

/// Raw search response document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults(Value);

impl SearchResults {
    /// Two-space indented JSON.
    pub fn pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.0)
    }
}

impl OpenSearchClient {
    /// Create a client from config.
    pub fn new(config: &Config) -> Result<Self, GatewayError> {
        let endpoint = config.endpoint()?;

        let http = reqwest::Client::builder()
            .timeout(config.backend_timeout())
            .connect_timeout(Duration::from_secs(2).min(config.backend_timeout()))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            index: config.search_index.clone(),
            field: config.search_field.clone(),
        })
    }

    /// Backend endpoint this client talks to.
    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    /// Info request against the backend root. True only on HTTP 200.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn probe(&self) -> bool {
        match self.http.get(self.endpoint.root().clone()).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!("OpenSearch info request succeeded");
                true
            }
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    "Unexpected OpenSearch response code"
                );
                false
            }
            Err(e) => {
                warn!(error = %e, "Error getting OpenSearch info");
                false
            }
        }
    }

    /// Run a match query and return the decoded response body.
    #[instrument(skip(self, query), fields(index = %self.index, query = %query))]
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let start = Instant::now();

        let result = self.send_search(query).await;
        match &result {
            Ok(_) => metrics::record_search_latency(start),
            Err(e) => {
                metrics::inc_search_failures();
                warn!(error = %e, "Search request failed");
            }
        }

        result
    }

    async fn send_search(&self, query: &SearchQuery) -> Result<SearchResults, SearchError> {
        let url = self.endpoint.join(&[self.index.as_str(), "_search"]);
        let body = SearchBody::match_query(&self.field, query);

        let response = self.http.post(url).json(&body).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(SearchError::UnexpectedStatus(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let document: Value = serde_json::from_slice(&bytes)?;

        debug!("Search response decoded");

        Ok(SearchResults(document))
    }
}
