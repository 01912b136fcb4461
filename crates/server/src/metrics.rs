//! Prometheus metrics
//!
//! The recorder is process-wide and installed once; `/metrics` renders it.

use axum::{http::StatusCode, response::IntoResponse};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;

use fir_assist_agent::TurnOutcome;

static PROMETHEUS: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Later calls return the same handle.
pub fn init_metrics() -> Option<PrometheusHandle> {
    match PROMETHEUS.get_or_try_init(|| PrometheusBuilder::new().install_recorder()) {
        Ok(handle) => Some(handle.clone()),
        Err(e) => {
            tracing::warn!(error = %e, "Failed to install Prometheus recorder");
            None
        },
    }
}

pub async fn metrics_handler() -> impl IntoResponse {
    match PROMETHEUS.get() {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics are disabled".to_string(),
        ),
    }
}

/// Record one processed turn
pub fn record_turn(outcome: &TurnOutcome, latency: Duration) {
    counter!("fir_turns_total").increment(1);
    histogram!("fir_turn_latency_seconds").record(latency.as_secs_f64());
    if outcome.failed {
        counter!("fir_turn_failures_total").increment(1);
    }
    if outcome.extraction_fallback {
        counter!("fir_extraction_fallback_total").increment(1);
    }
    if outcome.classification_fallback {
        counter!("fir_classification_fallback_total").increment(1);
    }
}

pub fn record_classification_fallback() {
    counter!("fir_classification_fallback_total").increment(1);
}
