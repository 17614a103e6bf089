// crates/core/src/analyst/provider.rs
//! Analyst trait: the seam between the chat bridge and the hosted service.

use async_trait::async_trait;

use super::types::{AnalystError, AnalystReply};

/// A natural-language analyst that answers with text, suggestions and SQL.
///
/// Implementations:
/// - `HttpAnalyst`: the hosted REST API
#[async_trait]
pub trait Analyst: Send + Sync {
    /// Send one prompt and return the structured reply. No retries.
    async fn send(&self, prompt: &str) -> Result<AnalystReply, AnalystError>;

    /// Whether the provider has everything it needs to make a call.
    fn is_configured(&self) -> bool;

    /// Provider name for logging.
    fn name(&self) -> &str;
}
