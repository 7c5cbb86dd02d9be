//! Curated "interesting markets" heuristics.
//!
//! Each heuristic degrades to an empty list when its inputs are missing
//! (no whale trades collected yet, no parseable close times, no snapshot
//! history), so a freshly created store renders as empty panels rather
//! than errors.

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::types::SmartFilterKey;
use rusqlite::Connection;

use super::markets::{market_row_from, MARKET_COLS};
use crate::models::{parse_close_time, MarketRow};

/// Pairs below this gap are routine price noise, not arb candidates.
const MIN_ARB_GAP: f64 = 0.03;

pub fn smart_filter(conn: &Connection, key: SmartFilterKey, limit: i64) -> Result<Vec<MarketRow>> {
    match key {
        SmartFilterKey::WhaleFavorites => whale_favorites(conn, limit),
        SmartFilterKey::ClosingSoon => closing_soon(conn, limit),
        SmartFilterKey::Near5050 => near_5050(conn, limit),
        SmartFilterKey::HighArb => high_arb(conn, limit),
        SmartFilterKey::Hottest24h => hottest_24h(conn, limit),
    }
}

/// Active markets ranked by how many whale trades reference them.
///
/// Whale trades carry Polymarket condition ids, so the join only ever
/// matches Polymarket rows; Kalshi markets cannot appear here.
fn whale_favorites(conn: &Connection, limit: i64) -> Result<Vec<MarketRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MARKET_COLS}, COUNT(w.id) AS whale_trades \
         FROM markets m \
         JOIN whale_trades w ON w.condition_id = m.platform_id AND m.platform = 'polymarket' \
         WHERE m.status = 'active' \
         GROUP BY m.id \
         ORDER BY whale_trades DESC, m.id \
         LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], |row| {
            let mut market = market_row_from(row)?;
            let trades: i64 = row.get(11)?;
            market.note = format!("{trades} whale trades");
            Ok(market)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Active markets whose close time falls within the next 24 hours,
/// soonest first. Close times are free-form platform text, so the parsing
/// happens here and unparseable rows are skipped.
fn closing_soon(conn: &Connection, limit: i64) -> Result<Vec<MarketRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MARKET_COLS} FROM markets m \
         WHERE m.status = 'active' AND m.close_time IS NOT NULL AND m.close_time != ''"
    ))?;
    let candidates = stmt
        .query_map([], market_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let now = Utc::now();
    let horizon = now + chrono::Duration::hours(24);
    let mut upcoming: Vec<(DateTime<Utc>, MarketRow)> = Vec::new();
    for mut market in candidates {
        let Some(close) = market.close_time.as_deref().and_then(parse_close_time) else {
            continue;
        };
        if close <= now || close > horizon {
            continue;
        }
        market.note = humanize_until(close - now);
        upcoming.push((close, market));
    }
    upcoming.sort_by_key(|(close, _)| *close);
    Ok(upcoming
        .into_iter()
        .take(usize::try_from(limit).unwrap_or(0))
        .map(|(_, market)| market)
        .collect())
}

/// Maximum-uncertainty markets: yes price inside [0.45, 0.55].
fn near_5050(conn: &Connection, limit: i64) -> Result<Vec<MarketRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MARKET_COLS} FROM markets m \
         WHERE m.status = 'active' AND m.yes_price BETWEEN 0.45 AND 0.55 \
         ORDER BY (m.volume IS NULL), m.volume DESC, m.id \
         LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], market_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Markets sitting on a matched pair whose platforms disagree on the price.
/// A market matched into several qualifying pairs appears once, annotated
/// with its widest gap.
fn high_arb(conn: &Connection, limit: i64) -> Result<Vec<MarketRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MARKET_COLS}, MAX(ABS(p.price_gap)) AS gap \
         FROM markets m \
         JOIN market_pairs p ON p.kalshi_market_id = m.id OR p.polymarket_market_id = m.id \
         WHERE m.status = 'active' AND p.price_gap IS NOT NULL AND ABS(p.price_gap) >= ?2 \
         GROUP BY m.id \
         ORDER BY (m.volume IS NULL), m.volume DESC, m.id \
         LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![limit, MIN_ARB_GAP], |row| {
            let mut market = market_row_from(row)?;
            let gap: f64 = row.get(11)?;
            market.note = format!("arb gap {gap:.2}");
            Ok(market)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Biggest absolute yes-price move over the last 24 hours, measured from
/// the newest snapshot at least 24 hours old to the latest snapshot.
/// Markets without history on both sides of the window drop out.
fn hottest_24h(conn: &Connection, limit: i64) -> Result<Vec<MarketRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT * FROM ( \
            SELECT {MARKET_COLS}, \
                (SELECT s.yes_price FROM price_snapshots s \
                 WHERE s.market_id = m.id \
                 ORDER BY s.timestamp DESC, s.id DESC LIMIT 1) AS latest_yes, \
                (SELECT s.yes_price FROM price_snapshots s \
                 WHERE s.market_id = m.id AND s.timestamp <= datetime('now', '-24 hours') \
                 ORDER BY s.timestamp DESC, s.id DESC LIMIT 1) AS baseline_yes \
            FROM markets m WHERE m.status = 'active' \
         ) \
         WHERE latest_yes IS NOT NULL AND baseline_yes IS NOT NULL \
         ORDER BY ABS(latest_yes - baseline_yes) DESC \
         LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], |row| {
            let mut market = market_row_from(row)?;
            let latest: f64 = row.get(11)?;
            let baseline: f64 = row.get(12)?;
            let delta = latest - baseline;
            market.note = format!("moved {delta:+.2} in 24h");
            Ok(market)
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn humanize_until(left: chrono::Duration) -> String {
    let mins = left.num_minutes().max(0);
    if mins >= 60 {
        format!("closes in {}h {}m", mins / 60, mins % 60)
    } else {
        format!("closes in {mins}m")
    }
}
