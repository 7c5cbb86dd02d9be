//! Full-page handlers. Each one parses its query string leniently, runs the
//! SQL through `call_named`, and renders an askama template.

use askama::Template;
use axum::extract::{Path, Query, State};
use axum::response::Html;
use serde::Deserialize;
use std::sync::Arc;

use common::types::{
    normalize_category, LeaderboardSort, MarketStatus, Platform, ReportType, Severity,
    SmartFilterKey, SortKey, TimeRange, TradeSide, ALERT_TYPES, CATEGORIES,
};

use crate::error::{WebError, WebResult};
use crate::metrics;
use crate::models::{
    AgentRow, AlertRow, AnalysisRow, InsightDetail, InsightRow, MarketDetail, MarketRow, Page,
    PairRow, PositionRow, SnapshotRow, TraderRow, WhaleRow,
};
use crate::queries;
use crate::routes::AppState;

/// Side-panel row caps. The main feeds are bounded by the config instead.
const ANALYSES_LIMIT: i64 = 10;
const RECENT_RUNS_LIMIT: i64 = 30;
const TRADER_TRADES_LIMIT: i64 = 25;

// --- Templates ---

#[derive(Template)]
#[template(path = "overview.html")]
struct OverviewTemplate;

#[derive(Template)]
#[template(path = "markets.html")]
struct MarketsTemplate {
    page: Page<MarketRow>,
    smart_active: String,
    smart_tabs: [SmartFilterKey; 5],
    categories: [&'static str; 8],
    selected_platform: String,
    selected_status: String,
    selected_category: String,
    selected_sort: String,
    q: String,
    /// Canonical query string without the page number, for pagination links.
    filter_qs: String,
}

#[derive(Template)]
#[template(path = "market_detail.html")]
struct MarketDetailTemplate {
    detail: MarketDetail,
    snapshots: Vec<SnapshotRow>,
    latest: Option<SnapshotRow>,
    range: String,
}

#[derive(Template)]
#[template(path = "pairs.html")]
struct PairsTemplate {
    pairs: Vec<PairRow>,
    analyses: Vec<AnalysisRow>,
    min_gap: String,
}

#[derive(Template)]
#[template(path = "alerts.html")]
struct AlertsTemplate {
    alerts: Vec<AlertRow>,
    alert_types: [&'static str; 6],
    selected_severity: String,
    selected_type: String,
    unacked_only: bool,
    unacked_count: i64,
}

#[derive(Template)]
#[template(path = "insights.html")]
struct InsightsTemplate {
    insights: Vec<InsightRow>,
    types: [ReportType; 3],
    selected_type: String,
}

#[derive(Template)]
#[template(path = "insight_detail.html")]
struct InsightDetailTemplate {
    detail: InsightDetail,
}

#[derive(Template)]
#[template(path = "agents.html")]
struct AgentsTemplate {
    latest: Vec<AgentRow>,
    recent: Vec<AgentRow>,
}

#[derive(Template)]
#[template(path = "whales.html")]
struct WhalesTemplate {
    trades: Vec<WhaleRow>,
    selected_side: String,
    min_usdc: String,
}

#[derive(Template)]
#[template(path = "leaderboard.html")]
struct LeaderboardTemplate {
    page: Page<TraderRow>,
    sort: String,
    q: String,
    results: Vec<TraderRow>,
    searching: bool,
}

#[derive(Template)]
#[template(path = "trader_detail.html")]
struct TraderDetailTemplate {
    trader: TraderRow,
    positions: Vec<PositionRow>,
    trades: Vec<WhaleRow>,
}

#[derive(Template)]
#[template(path = "watchlist.html")]
struct WatchlistTemplate {
    traders: Vec<TraderRow>,
}

// --- Handlers ---

pub async fn overview() -> WebResult<Html<String>> {
    metrics::page_hit("overview");
    Ok(Html(OverviewTemplate.render()?))
}

#[derive(Deserialize)]
pub struct MarketsParams {
    platform: Option<String>,
    status: Option<String>,
    category: Option<String>,
    sort: Option<String>,
    q: Option<String>,
    page: Option<i64>,
    smart: Option<String>,
}

/// The status filter defaults to active; `status=all` disables it and
/// unrecognized values fall back to the default.
fn parse_status(raw: Option<&str>) -> Option<MarketStatus> {
    match raw {
        None => Some(MarketStatus::Active),
        Some(s) if s.trim().eq_ignore_ascii_case("all") => None,
        Some(s) => Some(MarketStatus::from_str_loose(s).unwrap_or(MarketStatus::Active)),
    }
}

fn markets_query_string(
    platform: Option<Platform>,
    status: Option<MarketStatus>,
    category: Option<&'static str>,
    sort: SortKey,
    q: &str,
) -> String {
    let status_str = match status {
        Some(s) => s.as_str(),
        None => "all",
    };
    let mut qs = format!("status={status_str}&sort={}", sort.as_str());
    if let Some(platform) = platform {
        qs.push_str(&format!("&platform={}", platform.as_str()));
    }
    if let Some(category) = category {
        qs.push_str(&format!("&category={category}"));
    }
    if !q.is_empty() {
        qs.push_str(&format!("&q={}", urlencoding::encode(q)));
    }
    qs
}

pub async fn markets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketsParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("markets");

    let platform = params.platform.as_deref().and_then(Platform::from_str_loose);
    let status = parse_status(params.status.as_deref());
    let category = params.category.as_deref().and_then(normalize_category);
    let sort = SortKey::from_key(params.sort.as_deref().unwrap_or(""));
    let q = params.q.unwrap_or_default();
    let page_no = params.page.unwrap_or(1).max(1);
    let page_size = i64::from(state.cfg.page_size);

    let (page, smart_active) = if let Some(raw) = params.smart {
        // Smart views replace the paged list; an unknown key renders empty
        // rather than falling back to some other view.
        let (rows, active) = match SmartFilterKey::from_key(&raw) {
            Some(key) => {
                let limit = i64::from(state.cfg.smart_filter_limit);
                let rows = state
                    .db
                    .call_named("smart_filter", move |conn| {
                        queries::smart::smart_filter(conn, key, limit)
                    })
                    .await?;
                (rows, key.as_str().to_string())
            }
            None => (Vec::new(), raw),
        };
        let total = rows.len() as i64;
        (Page::build(rows, total, 1, page_size), active)
    } else {
        let filter = queries::markets::MarketFilter {
            platform,
            status,
            category,
            search: if q.is_empty() { None } else { Some(q.clone()) },
        };
        let page = state
            .db
            .call_named("list_markets", move |conn| {
                queries::markets::list_markets(conn, &filter, sort, page_no, page_size)
            })
            .await?;
        (page, String::new())
    };

    let selected_platform = match platform {
        Some(p) => p.as_str(),
        None => "",
    };
    let selected_status = match status {
        Some(s) => s.as_str(),
        None => "all",
    };
    let template = MarketsTemplate {
        page,
        smart_active,
        smart_tabs: SmartFilterKey::ALL,
        categories: CATEGORIES,
        selected_platform: selected_platform.to_string(),
        selected_status: selected_status.to_string(),
        selected_category: category.unwrap_or("").to_string(),
        selected_sort: sort.as_str().to_string(),
        filter_qs: markets_query_string(platform, status, category, sort, &q),
        q,
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct DetailParams {
    range: Option<String>,
}

pub async fn market_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<DetailParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("market_detail");
    let range = TimeRange::from_key(params.range.as_deref().unwrap_or(""));
    let limit = i64::from(state.cfg.price_history_limit);

    let (detail, snapshots, latest) = state
        .db
        .call_named("market_detail", move |conn| {
            let Some(detail) = queries::markets::market_by_id(conn, id)? else {
                return Ok((None, Vec::new(), None));
            };
            let snapshots = queries::history::price_history(conn, id, range, limit)?;
            let latest = queries::history::latest_snapshot(conn, id)?;
            Ok((Some(detail), snapshots, latest))
        })
        .await?;
    let Some(detail) = detail else {
        return Err(WebError::NotFound);
    };

    let template = MarketDetailTemplate {
        detail,
        snapshots,
        latest,
        range: range.as_str().to_string(),
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct PairsParams {
    min_gap: Option<String>,
}

pub async fn pairs(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PairsParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("pairs");
    let min_gap = params
        .min_gap
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok());

    let (pairs, analyses) = state
        .db
        .call_named("all_pairs", move |conn| {
            Ok((
                queries::pairs::all_pairs(conn, min_gap)?,
                queries::pairs::latest_analyses(conn, ANALYSES_LIMIT)?,
            ))
        })
        .await?;

    let template = PairsTemplate {
        pairs,
        analyses,
        min_gap: min_gap.map_or_else(String::new, |g| format!("{g}")),
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct AlertsParams {
    severity: Option<String>,
    #[serde(rename = "type")]
    alert_type: Option<String>,
    unacked: Option<String>,
}

pub async fn alerts(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AlertsParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("alerts");
    let severity = params.severity.as_deref().and_then(Severity::from_str_loose);
    let alert_type = params.alert_type.filter(|t| !t.is_empty());
    let unacked_only = params
        .unacked
        .as_deref()
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"));
    let limit = i64::from(state.cfg.alerts_limit);

    let filter = queries::alerts::AlertFilter {
        severity,
        alert_type: alert_type.clone(),
        unacked_only,
    };
    let (alerts, unacked_count) = state
        .db
        .call_named("list_alerts", move |conn| {
            Ok((
                queries::alerts::list_alerts(conn, &filter, limit)?,
                queries::alerts::unacked_alert_count(conn)?,
            ))
        })
        .await?;

    let selected_severity = match severity {
        Some(s) => s.as_str(),
        None => "",
    };
    let template = AlertsTemplate {
        alerts,
        alert_types: ALERT_TYPES,
        selected_severity: selected_severity.to_string(),
        selected_type: alert_type.unwrap_or_default(),
        unacked_only,
        unacked_count,
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct InsightsParams {
    #[serde(rename = "type")]
    report_type: Option<String>,
}

pub async fn insights(
    State(state): State<Arc<AppState>>,
    Query(params): Query<InsightsParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("insights");
    let report_type = params
        .report_type
        .as_deref()
        .and_then(ReportType::from_str_loose);
    let limit = i64::from(state.cfg.insights_limit);

    let insights = state
        .db
        .call_named("list_insights", move |conn| {
            queries::insights::list_insights(conn, report_type, limit)
        })
        .await?;

    let selected_type = match report_type {
        Some(t) => t.as_str(),
        None => "",
    };
    let template = InsightsTemplate {
        insights,
        types: ReportType::ALL,
        selected_type: selected_type.to_string(),
    };
    Ok(Html(template.render()?))
}

pub async fn insight_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    metrics::page_hit("insight_detail");
    let detail = state
        .db
        .call_named("insight_by_id", move |conn| {
            queries::insights::insight_by_id(conn, id)
        })
        .await?;
    let Some(detail) = detail else {
        return Err(WebError::NotFound);
    };
    Ok(Html(InsightDetailTemplate { detail }.render()?))
}

pub async fn agents(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    metrics::page_hit("agents");
    let (latest, recent) = state
        .db
        .call_named("agent_runs", move |conn| {
            Ok((
                queries::agents::latest_agent_runs(conn)?,
                queries::agents::recent_agent_runs(conn, RECENT_RUNS_LIMIT)?,
            ))
        })
        .await?;
    Ok(Html(AgentsTemplate { latest, recent }.render()?))
}

#[derive(Deserialize)]
pub struct WhalesParams {
    side: Option<String>,
    min_usdc: Option<String>,
}

pub async fn whales(
    State(state): State<Arc<AppState>>,
    Query(params): Query<WhalesParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("whales");
    let side = params.side.as_deref().and_then(TradeSide::from_str_loose);
    let min_usdc = params
        .min_usdc
        .as_deref()
        .and_then(|s| s.trim().parse::<f64>().ok());
    let limit = i64::from(state.cfg.whales_limit);

    let filter = queries::whales::WhaleFilter { side, min_usdc };
    let trades = state
        .db
        .call_named("list_whale_trades", move |conn| {
            queries::whales::list_whale_trades(conn, &filter, limit)
        })
        .await?;

    let selected_side = match side {
        Some(s) => s.as_str(),
        None => "",
    };
    let template = WhalesTemplate {
        trades,
        selected_side: selected_side.to_string(),
        min_usdc: min_usdc.map_or_else(String::new, |v| format!("{v}")),
    };
    Ok(Html(template.render()?))
}

#[derive(Deserialize)]
pub struct LeaderboardParams {
    sort: Option<String>,
    page: Option<i64>,
    q: Option<String>,
}

pub async fn leaderboard(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LeaderboardParams>,
) -> WebResult<Html<String>> {
    metrics::page_hit("leaderboard");
    let sort = LeaderboardSort::from_key(params.sort.as_deref().unwrap_or(""));
    let page_no = params.page.unwrap_or(1).max(1);
    let page_size = i64::from(state.cfg.page_size);
    let q = params.q.unwrap_or_default();

    let (page, results, searching) = if q.is_empty() {
        let page = state
            .db
            .call_named("top_traders", move |conn| {
                queries::traders::top_traders(conn, sort, page_no, page_size)
            })
            .await?;
        (page, Vec::new(), false)
    } else {
        let query = q.clone();
        let results = state
            .db
            .call_named("search_traders", move |conn| {
                queries::traders::search_traders(conn, &query)
            })
            .await?;
        (Page::build(Vec::new(), 0, 1, page_size), results, true)
    };

    let template = LeaderboardTemplate {
        page,
        sort: sort.as_str().to_string(),
        q,
        results,
        searching,
    };
    Ok(Html(template.render()?))
}

pub async fn trader_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    metrics::page_hit("trader_detail");
    let (trader, positions, trades) = state
        .db
        .call_named("trader_detail", move |conn| {
            let Some(trader) = queries::traders::trader_by_id(conn, id)? else {
                return Ok((None, Vec::new(), Vec::new()));
            };
            let positions = queries::traders::latest_positions(conn, id)?;
            let trades = queries::traders::trades_for_trader(conn, id, TRADER_TRADES_LIMIT)?;
            Ok((Some(trader), positions, trades))
        })
        .await?;
    let Some(trader) = trader else {
        return Err(WebError::NotFound);
    };

    let template = TraderDetailTemplate {
        trader,
        positions,
        trades,
    };
    Ok(Html(template.render()?))
}

pub async fn watchlist(State(state): State<Arc<AppState>>) -> WebResult<Html<String>> {
    metrics::page_hit("watchlist");
    let traders = state
        .db
        .call_named("watched_traders", |conn| {
            queries::watchlist::watched_traders(conn)
        })
        .await?;
    Ok(Html(WatchlistTemplate { traders }.render()?))
}

pub async fn metrics_endpoint(State(state): State<Arc<AppState>>) -> String {
    state.prom.run_upkeep();
    state.prom.render()
}
