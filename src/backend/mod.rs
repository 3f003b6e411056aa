//! OpenSearch backend access.
//!
//! This module handles:
//! - The validated search query and its match-query body
//! - The HTTP client used for the info probe and searches

pub mod client;
pub mod query;

pub use client::{OpenSearchClient, SearchResults};
pub use query::{SearchBody, SearchQuery};
