//! Prometheus metrics endpoint.
//!
//! Exposes application metrics in Prometheus text format at `GET /metrics`.

use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};

use crate::metrics::render_metrics;
use crate::state::AppState;

/// GET /metrics - Prometheus scrape target.
///
/// Returns 503 Service Unavailable if metrics are not initialized.
pub async fn metrics_handler() -> Response {
    match render_metrics() {
        Some(output) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        None => (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized").into_response(),
    }
}

/// Create the metrics routes router.
///
/// Mounted without the `/api` prefix.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/metrics", get(metrics_handler))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{do_get, seeded_app};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_metrics_endpoint_after_report() {
        crate::metrics::init_metrics();
        let app = seeded_app().await;
        let (status, _) = do_get(app.clone(), "/api/reports/customers").await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = do_get(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("report_requests_total"));
        assert!(body.contains("query_cache_misses_total"));
    }
}
