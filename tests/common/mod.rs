//! Shared helpers: a stub OpenSearch backend and a spawned gateway.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use search_gateway::{Application, Config, ServerPhase};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch, Notify};
use tokio::task::JoinHandle;

/// Canned answer for the stub's `_search` endpoint.
#[derive(Debug, Clone)]
pub struct StubSearch {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl StubSearch {
    pub fn ok(body: &str) -> Self {
        Self {
            status: StatusCode::OK,
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            body: r#"{"error":"stub failure"}"#.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[derive(Clone)]
struct StubState {
    info_status: StatusCode,
    search: StubSearch,
    received: Arc<Mutex<Vec<Value>>>,
    search_started: Arc<Notify>,
}

/// Minimal OpenSearch stand-in listening on an ephemeral port.
pub struct StubBackend {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
    search_started: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl StubBackend {
    pub async fn spawn(search: StubSearch) -> Self {
        Self::spawn_with_info(StatusCode::OK, search).await
    }

    pub async fn spawn_with_info(info_status: StatusCode, search: StubSearch) -> Self {
        let state = StubState {
            info_status,
            search,
            received: Arc::new(Mutex::new(Vec::new())),
            search_started: Arc::new(Notify::new()),
        };
        let received = state.received.clone();
        let search_started = state.search_started.clone();

        let router = Router::new()
            .route("/", get(stub_info))
            .route("/documents/_search", post(stub_search))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });

        Self {
            url: format!("http://127.0.0.1:{port}"),
            received,
            search_started,
            handle,
        }
    }

    /// Bodies of every `_search` request seen so far.
    pub fn received(&self) -> Vec<Value> {
        self.received.lock().unwrap().clone()
    }

    /// Resolves when the next `_search` request arrives.
    pub async fn search_started(&self) {
        self.search_started.notified().await;
    }

}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn stub_info(State(state): State<StubState>) -> (StatusCode, &'static str) {
    (state.info_status, r#"{"version":{"number":"2.11.0"}}"#)
}

async fn stub_search(
    State(state): State<StubState>,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    state.received.lock().unwrap().push(body);
    state.search_started.notify_one();
    if !state.search.delay.is_zero() {
        tokio::time::sleep(state.search.delay).await;
    }
    (state.search.status, state.search.body.clone())
}

/// Port that nothing listens on.
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn test_config(backend_url: &str) -> Config {
    let mut config = Config::with_backend(backend_url);
    config.port = 0;
    config.backend_timeout_secs = 2;
    config.readiness_max_attempts = 3;
    config.readiness_base_delay_ms = 10;
    config.shutdown_timeout_secs = 5;
    config
}

/// Gateway running in the background with a manual shutdown trigger.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub phase: watch::Receiver<ServerPhase>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<search_gateway::Result<()>>,
}

impl TestApp {
    pub async fn spawn(backend_url: &str) -> Self {
        Self::spawn_with(test_config(backend_url)).await
    }

    pub async fn spawn_with(config: Config) -> Self {
        let app = Application::build(&config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let mut phase = app.phase();
        let (tx, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(app.run_until_stopped(async move {
            let _ = rx.await;
        }));

        phase
            .wait_for(|p| matches!(p, ServerPhase::Serving | ServerPhase::Stopped))
            .await
            .expect("Lifecycle channel closed");

        TestApp {
            address: format!("http://127.0.0.1:{port}"),
            port,
            phase,
            shutdown: Some(tx),
            handle,
        }
    }

    /// Send the shutdown signal without waiting for the server.
    pub fn trigger_shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }

    /// Signal shutdown and wait for the lifecycle to finish.
    pub async fn stop(mut self) -> search_gateway::Result<()> {
        self.trigger_shutdown();
        self.handle.await.expect("Server task panicked")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("{}{}", self.address, path))
            .send()
            .await
            .expect("Failed to execute request")
    }
}
