// crates/core/src/analyst/config.rs
//! Analyst service configuration.

use super::types::AnalystError;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const MESSAGE_PATH: &str = "/api/v2/cortex/analyst/message";

#[derive(Debug, Clone, PartialEq)]
pub struct AnalystConfig {
    /// Scheme + authority, e.g. `https://acme.snowflakecomputing.com`.
    pub base_url: Option<String>,
    pub token: Option<String>,
    /// Fully qualified `DATABASE.SCHEMA.VIEW`.
    pub semantic_view: Option<String>,
    pub timeout_secs: u64,
}

impl Default for AnalystConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token: None,
            semantic_view: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl AnalystConfig {
    /// Build from the account host name (no scheme) and view parts.
    pub fn from_parts(
        host: Option<&str>,
        token: Option<&str>,
        database: Option<&str>,
        schema: Option<&str>,
        view: Option<&str>,
    ) -> Self {
        fn non_empty(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }
        let semantic_view = match (non_empty(database), non_empty(schema), non_empty(view)) {
            (Some(d), Some(s), Some(v)) => Some(format!("{d}.{s}.{v}")),
            _ => None,
        };
        Self {
            base_url: non_empty(host).map(|h| {
                if h.starts_with("http://") || h.starts_with("https://") {
                    h.trim_end_matches('/').to_string()
                } else {
                    format!("https://{}", h.trim_end_matches('/'))
                }
            }),
            token: non_empty(token).map(str::to_string),
            semantic_view,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.base_url.is_some() && self.token.is_some() && self.semantic_view.is_some()
    }

    pub fn endpoint(&self) -> Option<String> {
        self.base_url.as_ref().map(|b| format!("{b}{MESSAGE_PATH}"))
    }

    /// Endpoint, token and semantic view, or which of them is missing.
    pub fn require(&self) -> Result<(String, &str, &str), AnalystError> {
        let mut missing = Vec::new();
        if self.base_url.is_none() {
            missing.push("HOST");
        }
        if self.token.is_none() {
            missing.push("ANALYST_TOKEN");
        }
        if self.semantic_view.is_none() {
            missing.push("DATABASE/SCHEMA/SEMANTIC_VIEW");
        }
        match (self.endpoint(), self.token.as_deref(), self.semantic_view.as_deref()) {
            (Some(endpoint), Some(token), Some(view)) => Ok((endpoint, token, view)),
            _ => Err(AnalystError::NotConfigured(format!(
                "missing {}",
                missing.join(", ")
            ))),
        }
    }
}
