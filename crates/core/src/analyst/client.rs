// crates/core/src/analyst/client.rs
//! HTTP client for the hosted analyst REST API.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use super::config::AnalystConfig;
use super::provider::Analyst;
use super::types::{AnalystError, AnalystReply, AnalystRequest};

pub const REQUEST_ID_HEADER: &str = "X-Snowflake-Request-Id";

/// Longest error body kept in an error message.
const MAX_ERROR_BODY: usize = 500;

pub struct HttpAnalyst {
    config: AnalystConfig,
    client: reqwest::Client,
}

impl HttpAnalyst {
    pub fn new(config: AnalystConfig) -> Result<Self, AnalystError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AnalystError::Transport(e.to_string()))?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AnalystConfig {
        &self.config
    }

    fn classify(&self, e: reqwest::Error) -> AnalystError {
        if e.is_timeout() {
            AnalystError::Timeout(self.config.timeout_secs)
        } else if e.is_decode() {
            AnalystError::Decode(e.to_string())
        } else {
            AnalystError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl Analyst for HttpAnalyst {
    async fn send(&self, prompt: &str) -> Result<AnalystReply, AnalystError> {
        let (endpoint, token, semantic_view) = self.config.require()?;
        let body = AnalystRequest::user_prompt(prompt, semantic_view);
        let start = std::time::Instant::now();

        tracing::info!(prompt_len = prompt.len(), semantic_view, "analyst: sending prompt");

        let resp = self
            .client
            .post(&endpoint)
            .header(AUTHORIZATION, format!("Snowflake Token=\"{token}\""))
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "analyst: request failed"
                );
                self.classify(e)
            })?;

        let request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let status = resp.status();

        if status.as_u16() >= 400 {
            let mut text = resp.text().await.unwrap_or_default();
            text.truncate(
                text.char_indices()
                    .nth(MAX_ERROR_BODY)
                    .map(|(i, _)| i)
                    .unwrap_or(text.len()),
            );
            tracing::warn!(
                status = status.as_u16(),
                request_id = ?request_id,
                "analyst: non-success status"
            );
            return Err(AnalystError::Status {
                status: status.as_u16(),
                request_id: request_id.unwrap_or_else(|| "unknown".to_string()),
                body: text,
            });
        }

        let mut reply: AnalystReply = resp.json().await.map_err(|e| self.classify(e))?;
        if request_id.is_some() {
            reply.request_id = request_id;
        }

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            request_id = ?reply.request_id,
            blocks = reply.message.content.len(),
            "analyst: reply received"
        );
        Ok(reply)
    }

    fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    fn name(&self) -> &str {
        "cortex-analyst"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyst::types::ContentBlock;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, timeout_secs: u64) -> AnalystConfig {
        let mut cfg = AnalystConfig::from_parts(
            Some(&server.uri()),
            Some("secret"),
            Some("RETAIL"),
            Some("PUBLIC"),
            Some("SALES"),
        );
        cfg.timeout_secs = timeout_secs;
        cfg
    }

    #[tokio::test]
    async fn test_send_posts_prompt_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v2/cortex/analyst/message"))
            .and(header("Authorization", "Snowflake Token=\"secret\""))
            .and(body_json(json!({
                "messages": [{"role": "user", "content": [{"type": "text", "text": "top brands"}]}],
                "semantic_view": "RETAIL.PUBLIC.SALES"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("X-Snowflake-Request-Id", "req-42")
                    .set_body_json(json!({
                        "message": {
                            "role": "analyst",
                            "content": [
                                {"type": "text", "text": "Top brands by revenue"},
                                {"type": "sql", "statement": "SELECT BRAND FROM Products"}
                            ]
                        }
                    })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analyst = HttpAnalyst::new(config_for(&server, 5)).unwrap();
        let reply = analyst.send("top brands").await.unwrap();

        assert_eq!(reply.request_id.as_deref(), Some("req-42"));
        assert_eq!(reply.message.content.len(), 2);
        assert_eq!(
            reply.message.content[1],
            ContentBlock::Sql {
                statement: "SELECT BRAND FROM Products".into()
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500)
                    .insert_header("X-Snowflake-Request-Id", "req-err")
                    .set_body_string("warehouse suspended"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analyst = HttpAnalyst::new(config_for(&server, 5)).unwrap();
        let err = analyst.send("anything").await.unwrap_err();
        match err {
            AnalystError::Status {
                status,
                request_id,
                body,
            } => {
                assert_eq!(status, 500);
                assert_eq!(request_id, "req-err");
                assert_eq!(body, "warehouse suspended");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_reply_times_out_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({"message": {"role": "analyst", "content": []}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let analyst = HttpAnalyst::new(config_for(&server, 1)).unwrap();
        let err = analyst.send("slow").await.unwrap_err();
        assert!(matches!(err, AnalystError::Timeout(1)));
    }

    #[tokio::test]
    async fn test_unconfigured_never_calls_out() {
        let analyst = HttpAnalyst::new(AnalystConfig::default()).unwrap();
        assert!(!analyst.is_configured());
        let err = analyst.send("hello").await.unwrap_err();
        assert!(matches!(err, AnalystError::NotConfigured(_)));
    }
}
