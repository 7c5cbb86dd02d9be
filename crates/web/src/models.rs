//! View models for dashboard templates.
//! These are the typed structs that templates render; no DB access here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Paginated result envelope shared by the market list and the leaderboard.
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    /// Build the envelope from one page of rows plus the total count under
    /// the same filter. A page past the end simply carries no rows.
    pub fn build(rows: Vec<T>, total: i64, page: i64, page_size: i64) -> Self {
        let total_pages = if page_size > 0 {
            (total + page_size - 1) / page_size
        } else {
            0
        };
        Self {
            rows,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn prev_page(&self) -> i64 {
        (self.page - 1).max(1)
    }

    pub fn next_page(&self) -> i64 {
        self.page + 1
    }
}

/// Row in the market tables (list page, smart filters, overview movers).
pub struct MarketRow {
    pub id: i64,
    pub platform: String,
    pub platform_color: String,
    pub title: String,
    pub category: Option<String>,
    pub status: String,
    pub yes_price: Option<f64>,
    pub yes_display: String,
    pub no_display: String,
    pub volume: Option<f64>,
    pub volume_display: String,
    pub liquidity_tier: String,
    pub close_time: Option<String>,
    pub url: Option<String>,
    /// Extra context column filled by the smart filters ("14 whale trades",
    /// "closes in 3h", "Δ 0.07"); empty for the plain list.
    pub note: String,
}

/// Market detail header (everything the list row has, plus description).
pub struct MarketDetail {
    pub row: MarketRow,
    pub description: Option<String>,
    pub subcategory: Option<String>,
    pub liquidity_display: String,
    pub expiry_urgency: String,
    pub last_updated: Option<String>,
}

/// One price snapshot row on the market detail page.
pub struct SnapshotRow {
    pub timestamp: String,
    pub yes_price: Option<f64>,
    pub yes_display: String,
    pub no_display: String,
    pub volume_display: String,
    pub spread_display: String,
    pub best_bid_display: String,
    pub best_ask_display: String,
}

/// Cross-platform pair row.
pub struct PairRow {
    pub id: i64,
    pub kalshi_market_id: Option<i64>,
    pub polymarket_market_id: Option<i64>,
    pub kalshi_title: Option<String>,
    pub polymarket_title: Option<String>,
    pub kalshi_yes_display: String,
    pub polymarket_yes_display: String,
    pub price_gap: Option<f64>,
    pub gap_display: String,
    pub gap_color: String,
    pub confidence_display: String,
    pub match_reason: Option<String>,
    pub last_checked: Option<String>,
}

/// LLM analysis row on the pairs page.
pub struct AnalysisRow {
    pub id: i64,
    pub analysis_type: String,
    pub confidence_display: String,
    pub recommendation: Option<String>,
    pub created_at: String,
}

/// Alert row.
pub struct AlertRow {
    pub id: i64,
    pub alert_type: String,
    pub severity: String,
    pub severity_color: String,
    pub market_id: Option<i64>,
    pub market_title: Option<String>,
    pub title: String,
    pub message: Option<String>,
    pub acknowledged: bool,
    pub triggered_at: String,
}

/// Insight list row (content only loaded on the detail page).
pub struct InsightRow {
    pub id: i64,
    pub report_type: String,
    pub title: String,
    pub markets_covered: Option<i64>,
    pub model_used: Option<String>,
    pub tokens_display: String,
    pub created_at: String,
}

pub struct InsightDetail {
    pub row: InsightRow,
    pub content: String,
}

/// Latest run per agent, for the status page and the overview strip.
pub struct AgentRow {
    pub agent_name: String,
    pub status: String,
    pub status_color: String,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub duration_display: String,
    pub items_display: String,
    pub summary: Option<String>,
    pub error: Option<String>,
}

/// Trader row (leaderboard, search results, watchlist).
pub struct TraderRow {
    pub id: i64,
    pub proxy_wallet: String,
    pub wallet_short: String,
    pub display_name: String,
    pub verified: bool,
    pub total_pnl: Option<f64>,
    pub pnl_display: String,
    pub pnl_color: String,
    pub total_volume: Option<f64>,
    pub volume_display: String,
    pub portfolio_display: String,
    pub watched: bool,
}

/// Position row on the trader profile (latest snapshot batch only).
pub struct PositionRow {
    pub market_title: String,
    pub outcome: Option<String>,
    pub size_display: String,
    pub avg_price_display: String,
    pub cur_price_display: String,
    pub value_display: String,
    pub cash_pnl: Option<f64>,
    pub pnl_display: String,
    pub pnl_color: String,
    pub percent_display: String,
    pub redeemable: bool,
    pub snapshot_time: String,
}

/// Whale trade row.
pub struct WhaleRow {
    pub id: i64,
    pub trader_id: Option<i64>,
    pub wallet_short: String,
    pub trader_name: Option<String>,
    pub market_title: String,
    pub side: String,
    pub side_color: String,
    pub size_display: String,
    pub price_display: String,
    pub usdc_display: String,
    pub outcome: Option<String>,
    pub traded_at: String,
}

/// Counts for the overview stats strip.
pub struct OverviewCounts {
    pub markets_total: i64,
    pub polymarket_markets: i64,
    pub kalshi_markets: i64,
    pub pairs: i64,
    pub unacked_alerts: i64,
    pub whale_trades_24h: i64,
    pub traders: i64,
    pub insights: i64,
}

// Helper to truncate wallet addresses
pub fn shorten_wallet(addr: &str) -> String {
    if addr.len() > 10 {
        format!("{}..{}", &addr[..6], &addr[addr.len() - 4..])
    } else {
        addr.to_string()
    }
}

/// Compact USD display: $1.2M / $45.6K / $830.
pub fn fmt_usd_compact(v: f64) -> String {
    let abs = v.abs();
    if abs >= 1_000_000.0 {
        format!("${:.1}M", v / 1_000_000.0)
    } else if abs >= 1_000.0 {
        format!("${:.1}K", v / 1_000.0)
    } else {
        format!("${v:.0}")
    }
}

pub fn fmt_opt_usd_compact(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), fmt_usd_compact)
}

/// Probability display, two decimals; "-" when the collector has no quote.
pub fn fmt_price(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |p| format!("{p:.2}"))
}

/// Signed dollar P&L; the color class is picked separately by `pnl_color`.
pub fn fmt_pnl(v: Option<f64>) -> String {
    match v {
        Some(p) => {
            let sign = if p >= 0.0 { "+" } else { "" };
            format!("{sign}${p:.2}")
        }
        None => "-".to_string(),
    }
}

pub fn pnl_color(v: Option<f64>) -> String {
    match v {
        Some(p) if p >= 0.0 => "text-green-400".to_string(),
        Some(_) => "text-red-400".to_string(),
        None => "text-gray-600".to_string(),
    }
}

pub fn side_color(side: &str) -> String {
    if side == "BUY" {
        "bg-green-900/50 text-green-300"
    } else {
        "bg-red-900/50 text-red-300"
    }
    .to_string()
}

pub fn severity_color(severity: &str) -> String {
    match severity {
        "critical" => "bg-red-900/50 text-red-300",
        "warning" => "bg-yellow-900/50 text-yellow-300",
        _ => "bg-blue-900/50 text-blue-300",
    }
    .to_string()
}

pub fn platform_color(platform: &str) -> String {
    match platform {
        "polymarket" => "bg-indigo-900/50 text-indigo-300",
        "kalshi" => "bg-teal-900/50 text-teal-300",
        _ => "bg-gray-800 text-gray-400",
    }
    .to_string()
}

pub fn agent_status_color(status: &str) -> String {
    match status {
        "success" => "bg-green-500",
        "error" => "bg-red-500",
        "running" => "bg-blue-500",
        _ => "bg-gray-600",
    }
    .to_string()
}

/// Depth label from the volume/liquidity thresholds the analysis agents use.
pub fn liquidity_tier(volume: Option<f64>, liquidity: Option<f64>) -> &'static str {
    let vol = volume.unwrap_or(0.0);
    let liq = liquidity.unwrap_or(0.0);
    if vol >= 100_000.0 || liq >= 50_000.0 {
        "deep"
    } else if vol >= 10_000.0 || liq >= 5_000.0 {
        "moderate"
    } else if vol >= 1_000.0 || liq >= 500.0 {
        "thin"
    } else {
        "micro"
    }
}

/// Render a unix epoch (whale trade timestamps) as a UTC datetime.
pub fn fmt_epoch(ts: i64) -> String {
    DateTime::from_timestamp(ts, 0)
        .map_or_else(|| "-".to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

/// Close times come straight from the platform APIs and are not uniform:
/// Polymarket sends RFC 3339, Kalshi sends naive datetimes, and resolved
/// markets sometimes carry a bare date.
pub fn parse_close_time(raw: &str) -> Option<DateTime<Utc>> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}

/// Deadline label for the detail page. Unparseable close times read as
/// having no deadline rather than erroring.
pub fn expiry_urgency(close_time: Option<&str>) -> &'static str {
    let Some(close) = close_time.and_then(parse_close_time) else {
        return "no deadline";
    };
    let left = close - Utc::now();
    if left < chrono::Duration::zero() {
        "expired"
    } else if left < chrono::Duration::hours(24) {
        "imminent"
    } else if left < chrono::Duration::days(7) {
        "this week"
    } else if left < chrono::Duration::days(30) {
        "this month"
    } else {
        "later"
    }
}

pub fn fmt_confidence(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |c| format!("{:.0}%", c * 100.0))
}
