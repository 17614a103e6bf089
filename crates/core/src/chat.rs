// crates/core/src/chat.rs
//! Chat bridge: conversation history and rendering of analyst replies.
//!
//! A reply's SQL blocks are executed once, when the reply arrives, and the
//! shaped results are stored next to the message.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

use crate::analyst::{Analyst, ContentBlock};
use crate::table::Table;

pub const MAX_DISPLAY_ROWS: usize = 1000;
pub const MAX_CHART_ROWS: usize = 100;

/// Starter prompts offered on an empty conversation.
pub const STARTER_SUGGESTIONS: [&str; 6] = [
    "What are the top 10 products by revenue this quarter?",
    "Show me sales trends for the last 6 months",
    "Which customer segment generates the most revenue?",
    "Compare our prices with competitor benchmarks",
    "What is the average order value by payment method?",
    "Show inventory status for products out of stock",
];

/// Why an analyst statement produced no table.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// Refused before execution, e.g. not a single read statement.
    #[error("statement rejected: {0}")]
    Rejected(String),

    #[error("{0}")]
    Failed(String),
}

/// Runs analyst-generated SQL against the warehouse.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run_sql(&self, statement: &str) -> Result<Table, QueryError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub name: String,
    /// Non-numeric cells are `null`.
    pub values: Vec<Option<f64>>,
}

/// Chart-ready view: first column as the index, the rest as series.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub index_column: String,
    pub index: Vec<Value>,
    pub series: Vec<ChartSeries>,
    pub truncated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SqlOutput {
    NoResults {
        message: String,
    },
    Metric {
        label: String,
        value: Value,
    },
    #[serde(rename_all = "camelCase")]
    Table {
        columns: Vec<String>,
        rows: Vec<Vec<Value>>,
        total_rows: usize,
        truncated: bool,
        chart: Option<ChartData>,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlResult {
    /// Index of the SQL block within the message content.
    pub block: usize,
    pub statement: String,
    pub output: SqlOutput,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<SqlResult>,
}

impl ChatMessage {
    pub fn user(prompt: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: vec![ContentBlock::text(prompt)],
            request_id: None,
            results: Vec::new(),
        }
    }

    /// The chat-visible form of a failed exchange.
    pub fn error(err: impl Display) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: vec![ContentBlock::text(format!(
                "Sorry, I encountered an error: {err}"
            ))],
            request_id: None,
            results: Vec::new(),
        }
    }

    /// First SQL statement in the message, if any.
    pub fn first_sql(&self) -> Option<&str> {
        self.content.iter().find_map(|b| match b {
            ContentBlock::Sql { statement } => Some(statement.as_str()),
            _ => None,
        })
    }
}

/// Per-session conversation history.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn message(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Shape a query result for display: empty notice, single metric, or a
/// table capped at `MAX_DISPLAY_ROWS` with a chart of at most `MAX_CHART_ROWS`.
pub fn shape_result(table: Table) -> SqlOutput {
    if table.is_empty() {
        return SqlOutput::NoResults {
            message: "Query returned no results.".to_string(),
        };
    }
    if table.rows.len() == 1 && table.columns.len() == 1 {
        let label = table.columns.into_iter().next().unwrap_or_default();
        let value = table
            .rows
            .into_iter()
            .next()
            .and_then(|r| r.into_iter().next())
            .unwrap_or(Value::Null);
        return SqlOutput::Metric { label, value };
    }

    let total_rows = table.rows.len();
    let chart = chart_data(&table);
    let mut rows = table.rows;
    rows.truncate(MAX_DISPLAY_ROWS);
    SqlOutput::Table {
        columns: table.columns,
        rows,
        total_rows,
        truncated: total_rows > MAX_DISPLAY_ROWS,
        chart,
    }
}

fn chart_data(table: &Table) -> Option<ChartData> {
    if table.columns.len() < 2 || table.rows.len() < 2 {
        return None;
    }
    let rows = &table.rows[..table.rows.len().min(MAX_CHART_ROWS)];
    let index = rows
        .iter()
        .map(|r| r.first().cloned().unwrap_or(Value::Null))
        .collect();
    let series = table.columns[1..]
        .iter()
        .enumerate()
        .map(|(i, name)| ChartSeries {
            name: name.clone(),
            values: rows
                .iter()
                .map(|r| r.get(i + 1).and_then(numeric))
                .collect(),
        })
        .collect();
    Some(ChartData {
        index_column: table.columns[0].clone(),
        index,
        series,
        truncated: table.rows.len() > MAX_CHART_ROWS,
    })
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Ask the analyst and build the assistant message.
///
/// Never fails: service errors become an apology message and SQL errors
/// become `SqlOutput::Error` entries.
pub async fn respond(analyst: &dyn Analyst, runner: &dyn QueryRunner, prompt: &str) -> ChatMessage {
    let reply = match analyst.send(prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(provider = analyst.name(), error = %e, "chat: analyst call failed");
            return ChatMessage::error(e);
        }
    };

    let mut results = Vec::new();
    for (block, content) in reply.message.content.iter().enumerate() {
        if let ContentBlock::Sql { statement } = content {
            let output = match runner.run_sql(statement).await {
                Ok(table) => shape_result(table),
                Err(e) => {
                    tracing::warn!(error = %e, "chat: analyst SQL failed");
                    SqlOutput::Error {
                        message: format!("Error executing SQL: {e}"),
                    }
                }
            };
            results.push(SqlResult {
                block,
                statement: statement.clone(),
                output,
            });
        }
    }

    ChatMessage {
        role: ChatRole::Assistant,
        content: reply.message.content,
        request_id: reply.request_id,
        results,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyst::{AnalystError, AnalystMessage, AnalystReply};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedAnalyst(Result<Vec<ContentBlock>, u16>);

    #[async_trait]
    impl Analyst for ScriptedAnalyst {
        async fn send(&self, _prompt: &str) -> Result<AnalystReply, AnalystError> {
            match &self.0 {
                Ok(content) => Ok(AnalystReply {
                    message: AnalystMessage {
                        role: "analyst".into(),
                        content: content.clone(),
                    },
                    request_id: Some("r1".into()),
                    warnings: Vec::new(),
                }),
                Err(status) => Err(AnalystError::Status {
                    status: *status,
                    request_id: "r1".into(),
                    body: "nope".into(),
                }),
            }
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FixedRunner {
        table: Table,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl QueryRunner for FixedRunner {
        async fn run_sql(&self, _statement: &str) -> Result<Table, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }
    }

    struct FailingRunner(QueryError);

    #[async_trait]
    impl QueryRunner for FailingRunner {
        async fn run_sql(&self, _statement: &str) -> Result<Table, QueryError> {
            Err(self.0.clone())
        }
    }

    fn no_such_table() -> FailingRunner {
        FailingRunner(QueryError::Failed("no such table: Nope".into()))
    }

    fn table(columns: &[&str], rows: Vec<Vec<Value>>) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    #[test]
    fn test_shape_empty() {
        assert!(matches!(
            shape_result(table(&["a"], vec![])),
            SqlOutput::NoResults { .. }
        ));
    }

    #[test]
    fn test_shape_single_cell_is_metric() {
        let out = shape_result(table(&["TOTAL_REVENUE"], vec![vec![json!(1234.5)]]));
        assert_eq!(
            out,
            SqlOutput::Metric {
                label: "TOTAL_REVENUE".into(),
                value: json!(1234.5)
            }
        );
    }

    #[test]
    fn test_shape_caps_rows_and_chart() {
        let rows: Vec<Vec<Value>> = (0..1500).map(|i| vec![json!(format!("d{i}")), json!(i)]).collect();
        match shape_result(table(&["day", "revenue"], rows)) {
            SqlOutput::Table {
                rows,
                total_rows,
                truncated,
                chart,
                ..
            } => {
                assert_eq!(rows.len(), MAX_DISPLAY_ROWS);
                assert_eq!(total_rows, 1500);
                assert!(truncated);
                let chart = chart.unwrap();
                assert_eq!(chart.index.len(), MAX_CHART_ROWS);
                assert_eq!(chart.series[0].name, "revenue");
                assert_eq!(chart.series[0].values[3], Some(3.0));
                assert!(chart.truncated);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[test]
    fn test_single_column_table_has_no_chart() {
        match shape_result(table(&["brand"], vec![vec![json!("A")], vec![json!("B")]])) {
            SqlOutput::Table { chart, truncated, .. } => {
                assert!(chart.is_none());
                assert!(!truncated);
            }
            other => panic!("expected table, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_respond_runs_each_sql_block_once() {
        let analyst = ScriptedAnalyst(Ok(vec![
            ContentBlock::text("Here is revenue"),
            ContentBlock::Sql {
                statement: "SELECT SUM(TOTAL_SALE_AMOUNT) AS REVENUE FROM Sales".into(),
            },
        ]));
        let runner = FixedRunner {
            table: table(&["REVENUE"], vec![vec![json!(99.0)]]),
            calls: AtomicUsize::new(0),
        };

        let msg = respond(&analyst, &runner, "revenue?").await;

        assert_eq!(msg.role, ChatRole::Assistant);
        assert_eq!(msg.request_id.as_deref(), Some("r1"));
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(msg.results.len(), 1);
        assert_eq!(msg.results[0].block, 1);
        assert!(matches!(msg.results[0].output, SqlOutput::Metric { .. }));
    }

    #[tokio::test]
    async fn test_respond_turns_service_error_into_message() {
        let analyst = ScriptedAnalyst(Err(502));
        let msg = respond(&analyst, &no_such_table(), "hi").await;
        assert_eq!(msg.role, ChatRole::Assistant);
        match &msg.content[0] {
            ContentBlock::Text { text } => {
                assert!(text.starts_with("Sorry, I encountered an error: "));
                assert!(text.contains("502"));
            }
            other => panic!("expected text block, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_respond_keeps_sql_errors_in_chat() {
        let analyst = ScriptedAnalyst(Ok(vec![ContentBlock::Sql {
            statement: "SELECT * FROM Nope".into(),
        }]));
        let msg = respond(&analyst, &no_such_table(), "q").await;
        match &msg.results[0].output {
            SqlOutput::Error { message } => {
                assert_eq!(message, "Error executing SQL: no such table: Nope")
            }
            other => panic!("expected error output, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_respond_reports_rejected_statements() {
        let analyst = ScriptedAnalyst(Ok(vec![ContentBlock::Sql {
            statement: "DELETE FROM Sales".into(),
        }]));
        let runner = FailingRunner(QueryError::Rejected("only SELECT queries may be run".into()));
        let msg = respond(&analyst, &runner, "q").await;
        match &msg.results[0].output {
            SqlOutput::Error { message } => assert_eq!(
                message,
                "Error executing SQL: statement rejected: only SELECT queries may be run"
            ),
            other => panic!("expected error output, got {other:?}"),
        }
    }

    #[test]
    fn test_session_history() {
        let mut session = ChatSession::new();
        session.push(ChatMessage::user("hello"));
        session.push(ChatMessage::error("boom"));
        assert_eq!(session.messages().len(), 2);
        assert!(session.message(1).unwrap().first_sql().is_none());
        session.clear();
        assert!(session.is_empty());
    }
}
