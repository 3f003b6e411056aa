//! Application configuration loaded from environment variables.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::GatewayError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // === Backend ===
    /// OpenSearch endpoint, e.g. `http://localhost:9200`.
    pub opensearch_url: String,

    /// Index queried by `/search`.
    #[serde(default = "default_search_index")]
    pub search_index: String,

    /// Document field the match query targets.
    #[serde(default = "default_search_field")]
    pub search_field: String,

    /// Timeout applied to every backend HTTP request.
    #[serde(default = "default_backend_timeout")]
    pub backend_timeout_secs: u64,

    // === Readiness ===
    /// Maximum number of startup probes before giving up.
    #[serde(default = "default_readiness_attempts")]
    pub readiness_max_attempts: u32,

    /// Backoff step between probes; the n-th retry waits `n * step`.
    #[serde(default = "default_readiness_delay")]
    pub readiness_base_delay_ms: u64,

    // === Server Configuration ===
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Upper bound on handling a single request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// How long in-flight requests may run after a shutdown signal.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    // === Observability ===
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub rust_log: String,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Start the Prometheus exporter.
    #[serde(default)]
    pub metrics_enabled: bool,

    /// Prometheus exporter port.
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

fn default_search_index() -> String {
    "documents".to_string()
}

fn default_search_field() -> String {
    "content".to_string()
}

fn default_backend_timeout() -> u64 {
    10
}

fn default_readiness_attempts() -> u32 {
    10
}

fn default_readiness_delay() -> u64 {
    2000
}

fn default_port() -> u16 {
    8070
}

fn default_request_timeout() -> u64 {
    15
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Config {
    /// Load configuration from environment, reading .env file first.
    pub fn load() -> Result<Self, envy::Error> {
        dotenvy::dotenv().ok();
        envy::from_env()
    }

    /// Build a config for the given backend with every other value defaulted.
    pub fn with_backend(opensearch_url: impl Into<String>) -> Self {
        Self {
            opensearch_url: opensearch_url.into(),
            search_index: default_search_index(),
            search_field: default_search_field(),
            backend_timeout_secs: default_backend_timeout(),
            readiness_max_attempts: default_readiness_attempts(),
            readiness_base_delay_ms: default_readiness_delay(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            rust_log: default_log_level(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_port: default_metrics_port(),
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<(), String> {
        BackendEndpoint::parse(&self.opensearch_url)?;

        if self.search_index.trim().is_empty() {
            return Err("SEARCH_INDEX must not be empty".to_string());
        }

        if self.search_field.trim().is_empty() {
            return Err("SEARCH_FIELD must not be empty".to_string());
        }

        if self.readiness_max_attempts == 0 {
            return Err("READINESS_MAX_ATTEMPTS must be at least 1".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("REQUEST_TIMEOUT_SECS must be at least 1".to_string());
        }

        if self.metrics_enabled && self.metrics_port == self.port {
            return Err("METRICS_PORT must differ from PORT".to_string());
        }

        Ok(())
    }

    /// Parsed backend endpoint.
    pub fn endpoint(&self) -> Result<BackendEndpoint, GatewayError> {
        BackendEndpoint::parse(&self.opensearch_url).map_err(GatewayError::InvalidConfig)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Backend base URL, kept alongside the string it was configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    raw: String,
    url: Url,
}

impl BackendEndpoint {
    /// Parse and validate an http(s) endpoint.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if raw.trim().is_empty() {
            return Err("OPENSEARCH_URL is required".to_string());
        }

        let url = Url::parse(raw).map_err(|e| format!("OPENSEARCH_URL is not a valid URL: {e}"))?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(format!(
                "OPENSEARCH_URL must use http or https, got {}",
                url.scheme()
            ));
        }

        if url.cannot_be_a_base() || url.host().is_none() {
            return Err("OPENSEARCH_URL must include a host".to_string());
        }

        Ok(Self {
            raw: raw.to_string(),
            url,
        })
    }

    /// Root URL used for the info probe.
    pub fn root(&self) -> &Url {
        &self.url
    }

    /// URL of `<endpoint>/<segments...>`, preserving any base path.
    pub fn join(&self, segments: &[&str]) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// The endpoint exactly as configured.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for BackendEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_sensible() {
        let config = Config::with_backend("http://localhost:9200");
        assert_eq!(config.port, 8070);
        assert_eq!(config.search_index, "documents");
        assert_eq!(config.search_field, "content");
        assert_eq!(config.readiness_max_attempts, 10);
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn deserializes_from_env_pairs() {
        let vars = vec![
            ("OPENSEARCH_URL".to_string(), "http://search:9200".to_string()),
            ("PORT".to_string(), "9000".to_string()),
            ("LOG_FORMAT".to_string(), "json".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.opensearch_url, "http://search:9200");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.shutdown_timeout_secs, 10);
    }

    #[test]
    fn missing_backend_url_is_an_error() {
        let vars = vec![("PORT".to_string(), "9000".to_string())];
        let result: Result<Config, _> = envy::from_iter(vars);
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_bad_endpoint() {
        assert!(Config::with_backend("").validate().is_err());
        assert!(Config::with_backend("not a url").validate().is_err());
        assert!(Config::with_backend("ftp://search:21").validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::with_backend("http://localhost:9200");
        config.readiness_max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn endpoint_displays_as_configured() {
        let endpoint = BackendEndpoint::parse("http://localhost:9200").unwrap();
        assert_eq!(endpoint.to_string(), "http://localhost:9200");
        assert_eq!(endpoint.root().as_str(), "http://localhost:9200/");
    }

    #[test]
    fn endpoint_join_keeps_base_path() {
        let endpoint = BackendEndpoint::parse("https://proxy.local/opensearch/").unwrap();
        assert_eq!(
            endpoint.join(&["documents", "_search"]).as_str(),
            "https://proxy.local/opensearch/documents/_search"
        );

        let endpoint = BackendEndpoint::parse("http://localhost:9200").unwrap();
        assert_eq!(
            endpoint.join(&["documents", "_search"]).as_str(),
            "http://localhost:9200/documents/_search"
        );
    }
}
