//! End-to-end chat bridge: HTTP API → analyst (mocked) → local SQL → history
//! and CSV export.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use retail_hub_core::analyst::{AnalystConfig, HttpAnalyst};
use retail_hub_db::demo::seed_demo;
use retail_hub_db::Database;
use retail_hub_server::{create_app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MESSAGE_PATH: &str = "/api/v2/cortex/analyst/message";

async fn app_with_analyst(server: &MockServer) -> Router {
    let db = Database::new_in_memory().await.unwrap();
    let as_of = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
    seed_demo(&db, as_of).await.unwrap();
    let analyst = HttpAnalyst::new(AnalystConfig {
        base_url: Some(server.uri()),
        token: Some("tok".into()),
        semantic_view: Some("RETAIL.PUBLIC.SALES".into()),
        timeout_secs: 5,
    })
    .unwrap();
    create_app(AppState::pinned(db, Arc::new(analyst), as_of))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<(String, String)>, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            builder = builder.header("content-type", "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn prompt(app: &Router, session: &str, text: &str) -> Value {
    let (status, _, body) = send(
        app,
        Method::POST,
        &format!("/api/chat/{session}/messages"),
        Some(json!({ "prompt": text })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    serde_json::from_str(&body).unwrap()
}

fn analyst_reply(content: Value) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("X-Snowflake-Request-Id", "req-42")
        .set_body_json(json!({
            "message": { "role": "analyst", "content": content }
        }))
}

#[tokio::test]
async fn test_sql_reply_is_executed_and_exportable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGE_PATH))
        .and(header_eq("Authorization", "Snowflake Token=\"tok\""))
        .and(body_partial_json(json!({ "semantic_view": "RETAIL.PUBLIC.SALES" })))
        .respond_with(analyst_reply(json!([
            { "type": "text", "text": "Products per brand:" },
            { "type": "sql", "statement": "SELECT BRAND, COUNT(*) AS products FROM Products GROUP BY BRAND ORDER BY BRAND" },
            { "type": "suggestions", "suggestions": ["And per category?"] },
            { "type": "chart", "spec": {} }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let app = app_with_analyst(&server).await;
    let reply = prompt(&app, "demo", "How many products per brand?").await;

    assert_eq!(reply["role"], "assistant");
    assert_eq!(reply["requestId"], "req-42");
    // unknown block kinds survive untouched
    assert_eq!(reply["content"][3]["type"], "chart");
    assert_eq!(reply["content"][2]["suggestions"][0], "And per category?");

    let result = &reply["results"][0];
    assert_eq!(result["block"], 1);
    assert_eq!(result["output"]["kind"], "table");
    assert_eq!(result["output"]["totalRows"], 4);
    assert_eq!(result["output"]["truncated"], false);
    assert_eq!(result["output"]["chart"]["indexColumn"], "BRAND");
    assert_eq!(
        result["output"]["chart"]["index"],
        json!(["Acme", "Globex", "Initech", "Northwind"])
    );

    let (status, headers, csv) = send(&app, Method::GET, "/api/chat/demo/messages/1/csv", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers
        .iter()
        .any(|(k, v)| k == header::CONTENT_TYPE.as_str() && v.starts_with("text/csv")));
    assert!(headers
        .iter()
        .any(|(k, v)| k == header::CONTENT_DISPOSITION.as_str() && v.contains("attachment")));
    let lines: Vec<&str> = csv.split("\r\n").collect();
    assert_eq!(lines[0], "BRAND,products");
    assert_eq!(lines[1], "Acme,3");
    assert_eq!(lines.len(), 6);

    let (_, _, history) = send(&app, Method::GET, "/api/chat/demo", None).await;
    let history: Value = serde_json::from_str(&history).unwrap();
    assert_eq!(history["messages"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_single_cell_result_is_a_metric() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGE_PATH))
        .respond_with(analyst_reply(json!([
            { "type": "sql", "statement": "SELECT COUNT(*) AS product_count FROM Products" }
        ])))
        .mount(&server)
        .await;

    let app = app_with_analyst(&server).await;
    let reply = prompt(&app, "m", "How many products?").await;
    let output = &reply["results"][0]["output"];
    assert_eq!(output["kind"], "metric");
    assert_eq!(output["label"], "product_count");
    assert_eq!(output["value"], 12);
}

#[tokio::test]
async fn test_write_statements_are_refused() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGE_PATH))
        .respond_with(analyst_reply(json!([
            { "type": "sql", "statement": "DELETE FROM Sales" }
        ])))
        .mount(&server)
        .await;

    let app = app_with_analyst(&server).await;
    let reply = prompt(&app, "w", "Wipe the sales").await;
    let output = &reply["results"][0]["output"];
    assert_eq!(output["kind"], "error");
    assert!(output["message"].as_str().unwrap().starts_with("Error executing SQL"));

    // the export path applies the same guard
    let (status, _, body) = send(&app, Method::GET, "/api/chat/w/messages/1/csv", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Statement rejected"));

    // and the sales are still there
    let (status, _, body) = send(&app, Method::GET, "/api/reports/sales", None).await;
    assert_eq!(status, StatusCode::OK);
    let report: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(report["kpis"]["status"], "ready");
}

#[tokio::test]
async fn test_analyst_failure_becomes_chat_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(MESSAGE_PATH))
        .respond_with(
            ResponseTemplate::new(500)
                .insert_header("X-Snowflake-Request-Id", "r-9")
                .set_body_string("boom"),
        )
        .mount(&server)
        .await;

    let app = app_with_analyst(&server).await;
    let reply = prompt(&app, "e", "Anything").await;
    let text = reply["content"][0]["text"].as_str().unwrap();
    assert_eq!(
        text,
        "Sorry, I encountered an error: Failed request (id: r-9) with status 500: boom"
    );
    assert!(reply.get("results").is_none());
}
