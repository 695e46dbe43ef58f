//! Prometheus metrics and probe endpoints.
//!
//! Served on the metrics bind address:
//! - `GET /metrics`: Prometheus text exposition
//! - `GET /healthz`: liveness probe

use crate::reconciler::Outcome;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Controller metrics. Clones share the same registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconcile_total: IntCounterVec,
    patch_duration: Histogram,
}

impl Metrics {
    /// Creates and registers all controller metrics.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconcile_total = IntCounterVec::new(
            Opts::new(
                "node_capacity_reconcile_total",
                "Node reconciliations by outcome",
            ),
            &["outcome"],
        )?;
        let patch_duration = Histogram::with_opts(HistogramOpts::new(
            "node_capacity_patch_duration_seconds",
            "Latency of node status capacity patches",
        ))?;

        registry.register(Box::new(reconcile_total.clone()))?;
        registry.register(Box::new(patch_duration.clone()))?;

        Ok(Self {
            registry,
            reconcile_total,
            patch_duration,
        })
    }

    /// Counts one reconciliation outcome.
    pub fn record_outcome(&self, outcome: &Outcome) {
        self.reconcile_total
            .with_label_values(&[outcome.as_str()])
            .inc();
    }

    /// Records how long a patch request took.
    pub fn observe_patch_duration(&self, seconds: f64) {
        self.patch_duration.observe(seconds);
    }

    /// Count recorded for `outcome` so far.
    #[cfg(test)]
    pub fn outcome_count(&self, outcome: &str) -> u64 {
        self.reconcile_total.with_label_values(&[outcome]).get()
    }

    /// Renders the registry in Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// HTTP routes for metrics and probes.
pub fn router(metrics: Metrics) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Metrics>) -> Response {
    match metrics.render() {
        Ok(body) => (
            [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Serves `router(metrics)` until `shutdown` is cancelled.
pub async fn serve(
    listener: TcpListener,
    metrics: Metrics,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Serving metrics on {}", addr);
    }
    axum::serve(listener, router(metrics))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
