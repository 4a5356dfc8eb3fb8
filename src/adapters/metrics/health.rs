//! Observability Server - Probes and Metrics Exposition
//!
//! Exposes /live, /ready and /metrics via axum 0.7 for Docker health
//! checks and Prometheus scrapes. Readiness reflects venue health as
//! reported by the engines.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::sync::broadcast;
use tracing::{info, instrument};

use super::prometheus::MetricsRegistry;

/// Shared health state polled by readiness probes.
#[derive(Debug)]
pub struct HealthState {
    /// Whether at least one venue answers health checks.
    pub venues_healthy: AtomicBool,
    /// Whether the engine loop is running.
    pub engine_running: AtomicBool,
}

impl HealthState {
    /// Create a new health state (all healthy by default).
    pub fn new() -> Self {
        Self {
            venues_healthy: AtomicBool::new(true),
            engine_running: AtomicBool::new(true),
        }
    }

    /// Check if the system is ready to serve traffic.
    pub fn is_ready(&self) -> bool {
        self.venues_healthy.load(Ordering::Relaxed) && self.engine_running.load(Ordering::Relaxed)
    }
}

impl Default for HealthState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
struct ServerState {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
}

/// Axum HTTP server for probes and metrics exposition.
pub struct ObservabilityServer {
    health: Arc<HealthState>,
    metrics: Arc<MetricsRegistry>,
    bind_address: String,
}

impl ObservabilityServer {
    pub fn new(
        health: Arc<HealthState>,
        metrics: Arc<MetricsRegistry>,
        bind_address: String,
    ) -> Self {
        Self {
            health,
            metrics,
            bind_address,
        }
    }

    /// Serve until the shutdown signal fires.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) -> anyhow::Result<()> {
        let app = Router::new()
            .route("/live", get(Self::liveness))
            .route("/ready", get(Self::readiness))
            .route("/metrics", get(Self::metrics))
            .with_state(ServerState {
                health: Arc::clone(&self.health),
                metrics: Arc::clone(&self.metrics),
            });

        let listener = tokio::net::TcpListener::bind(&self.bind_address).await?;
        info!(address = %self.bind_address, "Observability server started");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        Ok(())
    }

    /// Liveness probe: always 200 while the process runs.
    async fn liveness() -> impl IntoResponse {
        (StatusCode::OK, "OK")
    }

    /// Readiness probe: 200 only while venues and the engine are healthy.
    async fn readiness(State(state): State<ServerState>) -> impl IntoResponse {
        if state.health.is_ready() {
            (StatusCode::OK, "READY")
        } else {
            (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
        }
    }

    /// Prometheus text exposition.
    async fn metrics(State(state): State<ServerState>) -> impl IntoResponse {
        (StatusCode::OK, state.metrics.gather_text())
    }
}
