// crates/core/src/analyst/types.rs
//! Wire types and errors for the hosted analyst API.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// One block of message content.
///
/// Block kinds the dashboard does not know are kept verbatim in `Other`
/// so history round-trips; rendering skips them.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Text { text: String },
    Suggestions { suggestions: Vec<String> },
    Sql { statement: String },
    Other(Value),
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    pub fn kind(&self) -> &str {
        match self {
            ContentBlock::Text { .. } => "text",
            ContentBlock::Suggestions { .. } => "suggestions",
            ContentBlock::Sql { .. } => "sql",
            ContentBlock::Other(v) => v.get("type").and_then(Value::as_str).unwrap_or("unknown"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedBlock {
    Text {
        text: String,
    },
    Suggestions {
        #[serde(default)]
        suggestions: Vec<String>,
    },
    Sql {
        statement: String,
    },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WireBlock {
    Tagged(TaggedBlock),
    Other(Value),
}

impl Serialize for ContentBlock {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = match self {
            ContentBlock::Text { text } => TaggedBlock::Text { text: text.clone() },
            ContentBlock::Suggestions { suggestions } => TaggedBlock::Suggestions {
                suggestions: suggestions.clone(),
            },
            ContentBlock::Sql { statement } => TaggedBlock::Sql {
                statement: statement.clone(),
            },
            ContentBlock::Other(value) => return value.serialize(serializer),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ContentBlock {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match WireBlock::deserialize(deserializer)? {
            WireBlock::Tagged(TaggedBlock::Text { text }) => ContentBlock::Text { text },
            WireBlock::Tagged(TaggedBlock::Suggestions { suggestions }) => {
                ContentBlock::Suggestions { suggestions }
            }
            WireBlock::Tagged(TaggedBlock::Sql { statement }) => ContentBlock::Sql { statement },
            WireBlock::Other(value) => ContentBlock::Other(value),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystMessage {
    pub role: String,
    pub content: Vec<ContentBlock>,
}

/// Request body for `POST /api/v2/cortex/analyst/message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystRequest {
    pub messages: Vec<AnalystMessage>,
    pub semantic_view: String,
}

impl AnalystRequest {
    /// A single-turn request carrying only the user's prompt.
    pub fn user_prompt(prompt: &str, semantic_view: &str) -> Self {
        Self {
            messages: vec![AnalystMessage {
                role: "user".to_string(),
                content: vec![ContentBlock::text(prompt)],
            }],
            semantic_view: semantic_view.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystReply {
    pub message: AnalystMessage,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,
}

/// Errors that can occur when talking to the analyst service.
#[derive(Debug, Error)]
pub enum AnalystError {
    #[error("Chat assistant is not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out after {0} seconds. Please try again with a simpler query.")]
    Timeout(u64),

    #[error("Failed request (id: {request_id}) with status {status}: {body}")]
    Status {
        status: u16,
        request_id: String,
        body: String,
    },

    #[error("Error communicating with the analyst service: {0}")]
    Transport(String),

    #[error("Failed to parse response: {0}")]
    Decode(String),
}
