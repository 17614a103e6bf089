// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use retail_hub_core::FilterError;
use retail_hub_db::DbError;
use serde::Serialize;
use thiserror::Error;
use ts_rs::TS;

/// Structured JSON error response for API errors
#[derive(Debug, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
        }
    }
}

/// API error types that map to HTTP status codes
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Chat session not found: {0}")]
    SessionNotFound(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::PageNotFound(_) | ApiError::SessionNotFound(_) | ApiError::NotFound(_) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Filter(_) | ApiError::BadRequest(_) | ApiError::Database(DbError::Rejected(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = match &self {
            ApiError::PageNotFound(slug) => {
                tracing::warn!(slug = %slug, "Page not found");
                ErrorResponse::with_details("Page not found", format!("Page: {slug}"))
            }
            ApiError::SessionNotFound(id) => {
                tracing::warn!(session_id = %id, "Chat session not found");
                ErrorResponse::with_details("Chat session not found", format!("Session ID: {id}"))
            }
            ApiError::NotFound(what) => {
                tracing::warn!(what = %what, "Not found");
                ErrorResponse::with_details("Not found", what.clone())
            }
            ApiError::Filter(err) => {
                tracing::warn!(error = %err, "Invalid filter");
                ErrorResponse::with_details("Invalid filter", err.to_string())
            }
            ApiError::Database(DbError::Rejected(reason)) => {
                tracing::warn!(reason = %reason, "Statement rejected");
                ErrorResponse::with_details("Statement rejected", reason.clone())
            }
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                ErrorResponse::with_details("Database error", db_err.to_string())
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                ErrorResponse::with_details("Bad request", msg.clone())
            }
        };

        (self.status(), Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
