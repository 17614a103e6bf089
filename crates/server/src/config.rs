// crates/server/src/config.rs
//! Runtime configuration: environment variables, overridable by CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use retail_hub_core::analyst::{config::DEFAULT_TIMEOUT_SECS, AnalystConfig};
use retail_hub_db::DEFAULT_CACHE_TTL;

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 47900;

#[derive(Debug, Clone, Parser)]
#[command(name = "retail-hub", version, about = "Retail intelligence dashboard server")]
pub struct Config {
    /// SQLite warehouse file (created if missing).
    #[arg(long, env = "RETAIL_HUB_WAREHOUSE")]
    pub warehouse: PathBuf,

    /// Listen port. Falls back to `PORT`, then 47900.
    #[arg(long, env = "RETAIL_HUB_PORT")]
    pub port: Option<u16>,

    /// Query cache time-to-live in seconds.
    #[arg(long, env = "RETAIL_HUB_CACHE_TTL_SECS", default_value_t = DEFAULT_CACHE_TTL.as_secs())]
    pub cache_ttl_secs: u64,

    /// Analyst account host, with or without scheme.
    #[arg(long = "analyst-host", env = "HOST")]
    pub host: Option<String>,

    #[arg(long, env = "DATABASE")]
    pub database: Option<String>,

    #[arg(long, env = "SCHEMA")]
    pub schema: Option<String>,

    #[arg(long, env = "SEMANTIC_VIEW")]
    pub semantic_view: Option<String>,

    #[arg(long, env = "ANALYST_TOKEN", hide_env_values = true)]
    pub analyst_token: Option<String>,

    #[arg(long, env = "ANALYST_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub analyst_timeout_secs: u64,

    /// Replace the warehouse contents with the sample data set before serving.
    #[arg(long)]
    pub seed_demo: bool,
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn analyst(&self) -> AnalystConfig {
        AnalystConfig {
            timeout_secs: self.analyst_timeout_secs,
            ..AnalystConfig::from_parts(
                self.host.as_deref(),
                self.analyst_token.as_deref(),
                self.database.as_deref(),
                self.schema.as_deref(),
                self.semantic_view.as_deref(),
            )
        }
    }
}
