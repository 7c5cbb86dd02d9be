//! Stat-strip counts for the overview page.

use anyhow::Result;
use rusqlite::Connection;

use super::whales::whale_count_since_24h;
use crate::models::OverviewCounts;

fn count(conn: &Connection, sql: &str) -> Result<i64> {
    let n = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(n)
}

pub fn overview_counts(conn: &Connection) -> Result<OverviewCounts> {
    Ok(OverviewCounts {
        markets_total: count(conn, "SELECT COUNT(*) FROM markets")?,
        polymarket_markets: count(
            conn,
            "SELECT COUNT(*) FROM markets WHERE platform = 'polymarket'",
        )?,
        kalshi_markets: count(conn, "SELECT COUNT(*) FROM markets WHERE platform = 'kalshi'")?,
        pairs: count(conn, "SELECT COUNT(*) FROM market_pairs")?,
        unacked_alerts: count(conn, "SELECT COUNT(*) FROM alerts WHERE acknowledged = 0")?,
        whale_trades_24h: whale_count_since_24h(conn)?,
        traders: count(conn, "SELECT COUNT(*) FROM traders")?,
        insights: count(conn, "SELECT COUNT(*) FROM insights")?,
    })
}
