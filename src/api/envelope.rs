//! Response envelope and its JSON encoding.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Serialize, Serializer};
use tracing::error;

/// Literal body used when the envelope itself cannot be encoded.
pub const FALLBACK_BODY: &str = r#"{"error": "Internal Server Error"}"#;

/// Uniform body returned by every endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    /// Informational message.
    Message(String),
    /// Successful search: message plus pretty-printed backend document.
    Results { message: String, results: String },
    /// Error detail.
    Error(String),
}

/// Wire shape: `{"message"?: ..., "error"?: ...}`.
///
/// Existing clients read search results from `error`, so `Results`
/// keeps that field name on the wire.
#[derive(Serialize)]
struct WireEnvelope<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Envelope {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(text.into())
    }

    pub fn error(detail: impl Into<String>) -> Self {
        Self::Error(detail.into())
    }

    fn wire(&self) -> WireEnvelope<'_> {
        match self {
            Self::Message(message) => WireEnvelope {
                message: Some(message.as_str()),
                error: None,
            },
            Self::Results { message, results } => WireEnvelope {
                message: Some(message.as_str()),
                error: Some(results.as_str()),
            },
            Self::Error(detail) => WireEnvelope {
                message: None,
                error: Some(detail.as_str()),
            },
        }
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.wire().serialize(serializer)
    }
}

/// Write `envelope` as JSON with `status`.
pub fn encode(status: StatusCode, envelope: &Envelope) -> Response {
    match serde_json::to_vec(envelope) {
        Ok(body) => json_response(status, body),
        Err(e) => {
            error!(error = %e, "Failed to encode response envelope");
            fallback()
        }
    }
}

/// Fixed 500 response; builds no JSON.
pub fn fallback() -> Response {
    json_response(StatusCode::INTERNAL_SERVER_ERROR, FALLBACK_BODY.as_bytes().to_vec())
}

fn json_response(status: StatusCode, body: Vec<u8>) -> Response {
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

/// Envelope paired with its status, for returning from handlers.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub envelope: Envelope,
}

impl ApiResponse {
    pub fn ok(envelope: Envelope) -> Self {
        Self {
            status: StatusCode::OK,
            envelope,
        }
    }

    pub fn error(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            envelope: Envelope::error(detail),
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        encode(self.status, &self.envelope)
    }
}
