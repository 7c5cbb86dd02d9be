//! Market dashboard web server.
//!
//! Read-mostly UI over the SQLite store the collector agents keep fresh.
//! Serves full pages plus small htmx fragments, a Prometheus scrape
//! endpoint, and the two writes the dashboard owns (alert acknowledgement
//! and the trader watchlist).

mod error;
mod metrics;
mod models;
mod queries;
mod routes;

use std::sync::Arc;

use anyhow::{Context, Result};

use common::config::Config;
use common::db::AsyncDb;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load().context("failed to load config")?;

    let (dispatch, _otel_guard) =
        common::observability::build_dispatch("dashboard", &cfg.general.log_level);
    tracing::dispatcher::set_global_default(dispatch)
        .context("failed to install tracing dispatcher")?;

    // The collectors usually create the data directory first, but a fresh
    // checkout should boot on its own too.
    if let Some(parent) = std::path::Path::new(&cfg.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let prom = metrics::init_global();
    let db = AsyncDb::open(&cfg.database.path)
        .await
        .with_context(|| format!("failed to open database at {}", cfg.database.path))?;

    let state = Arc::new(AppState {
        db,
        cfg: cfg.dashboard.clone(),
        prom,
    });
    let app = routes::create_router(state);

    let addr = format!("{}:{}", cfg.web.host, cfg.web.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "dashboard listening on {addr}");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
