//! Chat bridge endpoints: per-session history, prompts, and CSV export of
//! SQL results.
//!
//! A session's lock is released before the analyst call so one slow prompt
//! never blocks other requests.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use retail_hub_core::chat::{self, ChatMessage, ChatSession, STARTER_SUGGESTIONS};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_chat_turn;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct Suggestions {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NewSession {
    pub session: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CsvQuery {
    /// Content block index of the SQL to export; defaults to the first.
    pub block: Option<usize>,
}

/// GET /api/chat/suggestions - Starter prompts for an empty conversation.
pub async fn get_suggestions() -> Json<Suggestions> {
    Json(Suggestions {
        suggestions: STARTER_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    })
}

/// POST /api/chat - Open an empty session under a fresh id.
pub async fn create_session(State(state): State<Arc<AppState>>) -> (StatusCode, Json<NewSession>) {
    let session = uuid::Uuid::new_v4().to_string();
    state.chats.create(&session).await;
    tracing::debug!(session = %session, "chat session opened");
    (StatusCode::CREATED, Json(NewSession { session }))
}

/// GET /api/chat/{session} - Full history of one session.
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> ApiResult<Json<ChatSession>> {
    let chat = state
        .chats
        .get(&session)
        .await
        .ok_or(ApiError::SessionNotFound(session))?;
    let history = chat.lock().await.clone();
    Ok(Json(history))
}

/// DELETE /api/chat/{session} - Clear a session's history.
pub async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> ApiResult<StatusCode> {
    let chat = state
        .chats
        .get(&session)
        .await
        .ok_or_else(|| ApiError::SessionNotFound(session.clone()))?;
    chat.lock().await.clear();
    tracing::info!(session = %session, "chat history cleared");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/chat/{session}/messages - Send a prompt; returns the assistant reply.
///
/// Analyst failures come back as an assistant message, not an HTTP error.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(request): Json<PromptRequest>,
) -> ApiResult<Json<ChatMessage>> {
    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("prompt must not be empty".to_string()));
    }

    let chat = state.chats.get_or_create(&session).await;
    chat.lock().await.push(ChatMessage::user(prompt));

    let start = Instant::now();
    let reply = chat::respond(state.analyst.as_ref(), &state.db, prompt).await;
    record_chat_turn(start.elapsed());

    chat.lock().await.push(reply.clone());
    tracing::info!(
        session = %session,
        sql_results = reply.results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "chat turn complete"
    );
    Ok(Json(reply))
}

/// GET /api/chat/{session}/messages/{index}/csv - Re-run a reply's SQL and
/// download the full result.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Path((session, index)): Path<(String, usize)>,
    Query(query): Query<CsvQuery>,
) -> ApiResult<Response> {
    let statement = {
        let chat = state
            .chats
            .get(&session)
            .await
            .ok_or_else(|| ApiError::SessionNotFound(session.clone()))?;
        let chat = chat.lock().await;
        let message = chat
            .message(index)
            .ok_or_else(|| ApiError::NotFound(format!("message {index} in session {session}")))?;
        let statement = match query.block {
            Some(block) => message
                .results
                .iter()
                .find(|r| r.block == block)
                .map(|r| r.statement.clone()),
            None => message.first_sql().map(str::to_owned),
        };
        statement.ok_or_else(|| ApiError::NotFound(format!("SQL in message {index}")))?
    };

    let table = state.db.run_read_only(&statement).await?;
    tracing::debug!(rows = table.row_count(), "exporting chat result as CSV");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"query_results.csv\"",
            ),
        ],
        table.to_csv(),
    )
        .into_response())
}

/// Create the chat routes router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(create_session))
        .route("/chat/suggestions", get(get_suggestions))
        .route("/chat/{session}", get(get_session).delete(clear_session))
        .route("/chat/{session}/messages", post(post_message))
        .route("/chat/{session}/messages/{index}/csv", get(export_csv))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{do_get, do_request, seeded_app};
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_suggestions() {
        let app = seeded_app().await;
        let (status, body) = do_get(app, "/api/chat/suggestions").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["suggestions"].as_array().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_created_session_starts_empty() {
        let app = seeded_app().await;
        let (status, body) = do_request(app.clone(), Method::POST, "/api/chat", None).await;
        assert_eq!(status, StatusCode::CREATED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        let id = json["session"].as_str().unwrap();
        assert_eq!(id.len(), 36);

        let (status, body) = do_get(app, &format!("/api/chat/{id}")).await;
        assert_eq!(status, StatusCode::OK);
        let history: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(history["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_analyst_replies_with_error_message() {
        let app = seeded_app().await;
        let (status, body) = do_request(
            app.clone(),
            Method::POST,
            "/api/chat/s1/messages",
            Some(r#"{"prompt":"Top brands?"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let reply: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(reply["role"], "assistant");
        let text = reply["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("Sorry, I encountered an error:"), "{text}");

        let (status, body) = do_get(app, "/api/chat/s1").await;
        assert_eq!(status, StatusCode::OK);
        let history: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(history["messages"].as_array().unwrap().len(), 2);
        assert_eq!(history["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_400() {
        let app = seeded_app().await;
        let (status, _) =
            do_request(app, Method::POST, "/api/chat/s1/messages", Some(r#"{"prompt":"  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_session_is_404() {
        let app = seeded_app().await;
        let (status, _) = do_get(app.clone(), "/api/chat/nobody").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = do_request(app.clone(), Method::DELETE, "/api/chat/nobody", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = do_get(app, "/api/chat/nobody/messages/0/csv").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_clear_history() {
        let app = seeded_app().await;
        do_request(
            app.clone(),
            Method::POST,
            "/api/chat/s2/messages",
            Some(r#"{"prompt":"hello"}"#),
        )
        .await;
        let (status, _) = do_request(app.clone(), Method::DELETE, "/api/chat/s2", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = do_get(app, "/api/chat/s2").await;
        let history: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert!(history["messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_csv_for_message_without_sql_is_404() {
        let app = seeded_app().await;
        do_request(
            app.clone(),
            Method::POST,
            "/api/chat/s3/messages",
            Some(r#"{"prompt":"hello"}"#),
        )
        .await;
        let (status, _) = do_get(app.clone(), "/api/chat/s3/messages/1/csv").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = do_get(app, "/api/chat/s3/messages/9/csv").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
