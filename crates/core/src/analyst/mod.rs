// crates/core/src/analyst/mod.rs
//! Natural-language analyst integration.
//!
//! Provides the `Analyst` trait and the HTTP implementation that talks to
//! the hosted NL-to-SQL service.

pub mod client;
pub mod config;
pub mod provider;
pub mod types;

pub use client::HttpAnalyst;
pub use config::AnalystConfig;
pub use provider::Analyst;
pub use types::{AnalystError, AnalystMessage, AnalystReply, AnalystRequest, ContentBlock};
