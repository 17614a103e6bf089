//! Prometheus metrics for report builds, chat turns and the query cache.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Returns `true` if initialization succeeded, `false` if already initialized.
pub fn init_metrics() -> bool {
    if PROMETHEUS_HANDLE.get().is_some() {
        return false;
    }

    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();

    if metrics::set_global_recorder(recorder).is_err() {
        tracing::warn!("Failed to set global metrics recorder (already set)");
        return false;
    }

    if PROMETHEUS_HANDLE.set(handle).is_err() {
        tracing::warn!("Failed to store Prometheus handle (already set)");
    }

    describe_metrics();

    tracing::info!("Prometheus metrics initialized");
    true
}

fn describe_metrics() {
    describe_counter!(
        "report_requests_total",
        "Total number of report and page requests by endpoint and status"
    );
    describe_histogram!(
        "report_request_duration_seconds",
        "Duration of report builds in seconds"
    );
    describe_counter!("chat_turns_total", "Prompts sent to the analyst");
    describe_histogram!(
        "chat_turn_duration_seconds",
        "Analyst round trip plus local SQL execution in seconds"
    );
    describe_counter!("query_cache_hits_total", "Query cache lookups served from cache");
    describe_counter!(
        "query_cache_misses_total",
        "Query cache lookups that ran the warehouse query"
    );
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

/// Record a completed report request.
pub fn record_request(endpoint: &str, status: &str, duration: Duration) {
    counter!("report_requests_total", "endpoint" => endpoint.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("report_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

/// Record one chat turn, successful or not.
pub fn record_chat_turn(duration: Duration) {
    counter!("chat_turns_total").increment(1);
    histogram!("chat_turn_duration_seconds").record(duration.as_secs_f64());
}
