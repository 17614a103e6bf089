//! Shared fixtures for route tests.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use retail_hub_core::analyst::{AnalystConfig, HttpAnalyst};
use retail_hub_db::demo::seed_demo;
use retail_hub_db::Database;
use tower::ServiceExt;

use crate::state::AppState;

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
}

/// App over a seeded in-memory warehouse, pinned to `as_of()`, with an
/// unconfigured analyst.
pub async fn seeded_app() -> Router {
    let db = Database::new_in_memory().await.expect("in-memory DB");
    seed_demo(&db, as_of()).await.expect("seed");
    let analyst = HttpAnalyst::new(AnalystConfig::default()).unwrap();
    crate::create_app(AppState::pinned(db, Arc::new(analyst), as_of()))
}

pub async fn do_request(
    app: Router,
    method: Method,
    uri: &str,
    json: Option<&str>,
) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match json {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

pub async fn do_get(app: Router, uri: &str) -> (StatusCode, String) {
    do_request(app, Method::GET, uri, None).await
}
