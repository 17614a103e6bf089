// crates/server/src/main.rs
//! retail-hub server binary.
//!
//! Opens the warehouse, optionally seeds the sample data set, and serves the
//! dashboard API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use retail_hub_core::analyst::{Analyst, HttpAnalyst};
use retail_hub_db::demo::seed_demo;
use retail_hub_db::Database;
use retail_hub_server::{create_app, init_metrics, AppState, Config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,retail_hub=info"));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    let config = Config::parse();
    let startup_start = Instant::now();

    init_metrics();

    eprintln!("\n\u{1f4ca} retail-hub v{}\n", env!("CARGO_PKG_VERSION"));

    let db = Database::new(&config.warehouse)
        .await
        .with_context(|| format!("opening warehouse {}", config.warehouse.display()))?
        .with_cache_ttl(config.cache_ttl());

    if config.seed_demo {
        let summary = seed_demo(&db, Local::now().date_naive()).await?;
        eprintln!(
            "  \u{2713} Seeded demo data: {} products, {} sales, {} price scrapes",
            summary.products, summary.sales, summary.pricing
        );
    }

    let analyst = HttpAnalyst::new(config.analyst())?;
    if !analyst.is_configured() {
        tracing::warn!("analyst service not configured; the assistant will reply with setup errors");
    }

    let app = create_app(AppState::new(db, Arc::new(analyst)));

    let port = config.port();
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    eprintln!(
        "  \u{2713} Ready in {}ms",
        startup_start.elapsed().as_millis()
    );
    eprintln!("  \u{2192} http://localhost:{}\n", port);

    axum::serve(listener, app).await?;

    Ok(())
}
