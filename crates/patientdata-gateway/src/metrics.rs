//! Prometheus metrics for the gateway.
//!
//! - [`MetricsConfig`] / [`init_metrics`]: install the recorder once at startup
//! - [`metrics_handler`]: `GET /metrics` exposition
//! - business helpers for tool invocations, chat turns and HTTP requests

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl MetricsConfig {
    /// `METRICS_ENABLED`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let enabled = std::env::var("METRICS_ENABLED")
            .map(|v| v.to_lowercase() != "false")
            .unwrap_or(true);
        Self { enabled }
    }
}

/// Install the Prometheus recorder. Subsequent calls return an error.
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Err(MetricsError::Disabled);
    }
    if PROMETHEUS_HANDLE.get().is_some() {
        return Err(MetricsError::AlreadyInitialized);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| MetricsError::InstallFailed(e.to_string()))?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::AlreadyInitialized)
}

/// Axum handler for the `/metrics` endpoint.
pub async fn metrics_handler() -> String {
    PROMETHEUS_HANDLE
        .get()
        .map(|h| h.render())
        .unwrap_or_else(|| "# Metrics not initialized\n".to_string())
}

#[derive(Debug, Clone)]
pub enum MetricsError {
    Disabled,
    AlreadyInitialized,
    InstallFailed(String),
}

impl std::fmt::Display for MetricsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetricsError::Disabled => write!(f, "metrics are disabled"),
            MetricsError::AlreadyInitialized => write!(f, "metrics recorder already initialized"),
            MetricsError::InstallFailed(e) => {
                write!(f, "failed to install metrics recorder: {}", e)
            }
        }
    }
}

impl std::error::Error for MetricsError {}

// =============================================================================
// Business Metrics Helpers
// =============================================================================

/// Count one bridged tool invocation.
///
/// `outcome` is one of `ok`, `tool_error` or `transport_error`.
pub fn record_tool_invocation(tool: &str, outcome: &str) {
    metrics::counter!(
        "patientdata_tool_invocations_total",
        "tool" => tool.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Wall time of one bridged tool invocation, subprocess lifecycle included.
pub fn record_tool_latency(tool: &str, elapsed: Duration) {
    metrics::histogram!(
        "patientdata_tool_duration_seconds",
        "tool" => tool.to_string()
    )
    .record(elapsed.as_secs_f64());
}

/// Count one chat turn and how many tool calls the oracle requested.
pub fn record_chat_turn(tool_calls: usize, outcome: &str) {
    metrics::counter!(
        "patientdata_chat_turns_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
    metrics::histogram!("patientdata_chat_tool_calls").record(tool_calls as f64);
}

/// Count and time one HTTP request by route template and status bucket.
pub fn record_http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => route.to_string(),
        "status" => status_bucket(status)
    )
    .increment(1);
    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => route.to_string()
    )
    .record(elapsed.as_secs_f64());
}

fn status_bucket(status: u16) -> &'static str {
    match status {
        200..=299 => "2xx",
        300..=399 => "3xx",
        400..=499 => "4xx",
        500..=599 => "5xx",
        _ => "other",
    }
}
