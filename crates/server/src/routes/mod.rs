//! API route handlers for the retail-hub server.

pub mod chat;
pub mod health;
pub mod metrics;
pub mod options;
pub mod pages;
pub mod reports;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined router.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/pages - Navigation list
/// - GET /api/pages/{slug} - Render one page with query-string filters
/// - GET /api/reports/{sales,products,benchmarking,customers} - One report
/// - GET /api/options/{source} - Selector values
/// - POST /api/chat - Open a session with a generated id
/// - GET /api/chat/suggestions - Starter prompts
/// - GET /api/chat/{session} - Chat history
/// - DELETE /api/chat/{session} - Clear chat history
/// - POST /api/chat/{session}/messages - Send a prompt
/// - GET /api/chat/{session}/messages/{index}/csv - Download a SQL result
/// - GET /metrics - Prometheus metrics
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", pages::router())
        .nest("/api", reports::router())
        .nest("/api", options::router())
        .nest("/api", chat::router())
        .merge(metrics::router())
        .with_state(state)
}
