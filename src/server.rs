//! Server lifecycle: bind, readiness gate, serve, drain.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use strum::Display;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::api::{create_router, AppState};
use crate::backend::OpenSearchClient;
use crate::config::Config;
use crate::error::{GatewayError, Result};
use crate::readiness::{wait_until_ready, ReadinessPolicy};
use crate::shutdown::Shutdown;

/// Where the server is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ServerPhase {
    /// Listener bound, waiting for the backend.
    Starting,
    /// Accepting and dispatching requests.
    Serving,
    /// Listener closed, in-flight requests finishing.
    Draining,
    /// Done, successfully or not.
    Stopped,
}

/// A bound but not yet serving gateway.
pub struct Application {
    listener: TcpListener,
    port: u16,
    router: Router,
    client: OpenSearchClient,
    readiness: ReadinessPolicy,
    shutdown_timeout: Duration,
    phase: watch::Sender<ServerPhase>,
}

impl Application {
    /// Build the backend client from config and bind the listener.
    pub async fn build(config: &Config) -> Result<Self> {
        let client = OpenSearchClient::new(config)?;
        Self::build_with_client(config, client).await
    }

    /// Bind the listener for an already constructed client.
    pub async fn build_with_client(config: &Config, client: OpenSearchClient) -> Result<Self> {
        let (phase, _) = watch::channel(ServerPhase::Starting);

        let router = create_router(AppState::new(client.clone()), config.request_timeout());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            error!(%addr, error = %e, "Failed to bind TCP listener");
            e
        })?;
        let port = listener.local_addr()?.port();

        info!(port, backend = %client.endpoint(), "Listener bound");

        Ok(Self {
            listener,
            port,
            router,
            client,
            readiness: ReadinessPolicy::from_config(config),
            shutdown_timeout: config.shutdown_timeout(),
            phase,
        })
    }

    /// Port actually bound (useful when configured with 0).
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Watch lifecycle transitions.
    pub fn phase(&self) -> watch::Receiver<ServerPhase> {
        self.phase.subscribe()
    }

    /// Wait for the backend, serve until `signal` resolves, then drain.
    ///
    /// Fails without ever serving if the backend stays unreachable, and
    /// fails if in-flight requests outlive the drain deadline.
    pub async fn run_until_stopped<F>(self, signal: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self {
            listener,
            port,
            router,
            client,
            readiness,
            shutdown_timeout,
            phase,
        } = self;

        if let Err(e) = wait_until_ready(&readiness, || client.probe()).await {
            error!(error = %e, "Unable to connect to OpenSearch");
            drop(listener);
            phase.send_replace(ServerPhase::Stopped);
            return Err(e);
        }

        let shutdown = Shutdown::new();
        let trigger = shutdown.clone();
        let signal_task = tokio::spawn(async move {
            signal.await;
            if trigger.trigger() {
                info!("Shutting down server...");
            }
        });

        let drain = shutdown.clone();
        let serve = axum::serve(listener, router).with_graceful_shutdown(async move {
            drain.wait().await;
        });
        let mut server = tokio::spawn(async move { serve.await });

        phase.send_replace(ServerPhase::Serving);
        info!(port, "Serving requests");

        let result = tokio::select! {
            finished = &mut server => {
                // Only reachable if serving failed on its own.
                let result = join_result(finished);
                if let Err(e) = &result {
                    error!(error = %e, "Server failed");
                }
                result
            }
            _ = shutdown.wait() => {
                phase.send_replace(ServerPhase::Draining);
                info!(
                    timeout_ms = shutdown_timeout.as_millis() as u64,
                    "Listener closed, draining in-flight requests"
                );

                match tokio::time::timeout(shutdown_timeout, &mut server).await {
                    Ok(finished) => join_result(finished),
                    Err(_) => {
                        // Connection tasks are spawned by axum and outlive the
                        // serve task; they close when the process exits.
                        warn!("Drain deadline exceeded, abandoning remaining connections");
                        server.abort();
                        Err(GatewayError::Server("drain deadline exceeded".to_string()))
                    }
                }
            }
        };

        signal_task.abort();
        phase.send_replace(ServerPhase::Stopped);

        if result.is_ok() {
            info!("Server stopped gracefully");
        }

        result
    }
}

fn join_result(finished: std::result::Result<std::io::Result<()>, JoinError>) -> Result<()> {
    match finished {
        Ok(served) => served.map_err(GatewayError::from),
        Err(e) => Err(GatewayError::Server(e.to_string())),
    }
}
