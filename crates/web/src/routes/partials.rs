//! HTML fragments the overview page polls over htmx. These return bare
//! markup with no base layout so they can be swapped into the page.

use askama::Template;
use axum::extract::State;
use axum::response::Html;
use std::sync::Arc;

use common::types::SmartFilterKey;

use crate::error::WebResult;
use crate::models::{AgentRow, AlertRow, MarketRow, OverviewCounts};
use crate::queries;
use crate::routes::AppState;

/// Row cap for each overview panel.
const OVERVIEW_ROWS: i64 = 8;

#[derive(Template)]
#[template(path = "partials/stats_strip.html")]
struct StatsStripTemplate {
    counts: OverviewCounts,
}

#[derive(Template)]
#[template(path = "partials/agent_strip.html")]
struct AgentStripTemplate {
    agents: Vec<AgentRow>,
}

#[derive(Template)]
#[template(path = "partials/alert_list.html")]
struct AlertListTemplate {
    alerts: Vec<AlertRow>,
}

#[derive(Template)]
#[template(path = "partials/movers.html")]
struct MoversTemplate {
    movers: Vec<MarketRow>,
}

pub async fn stats(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let counts = state
        .db
        .call_named("overview_counts", |conn| {
            queries::overview::overview_counts(conn)
        })
        .await?;
    Ok(Html(StatsStripTemplate { counts }.render()?))
}

pub async fn agents(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let agents = state
        .db
        .call_named("latest_agent_runs", |conn| {
            queries::agents::latest_agent_runs(conn)
        })
        .await?;
    Ok(Html(AgentStripTemplate { agents }.render()?))
}

pub async fn alerts(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let filter = queries::alerts::AlertFilter {
        unacked_only: true,
        ..Default::default()
    };
    let alerts = state
        .db
        .call_named("overview_alerts", move |conn| {
            queries::alerts::list_alerts(conn, &filter, OVERVIEW_ROWS)
        })
        .await?;
    Ok(Html(AlertListTemplate { alerts }.render()?))
}

pub async fn movers(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    let movers = state
        .db
        .call_named("overview_movers", |conn| {
            queries::smart::smart_filter(conn, SmartFilterKey::Hottest24h, OVERVIEW_ROWS)
        })
        .await?;
    Ok(Html(MoversTemplate { movers }.render()?))
}
