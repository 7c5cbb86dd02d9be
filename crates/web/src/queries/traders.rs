//! Trader leaderboard, profile, and position queries.

use anyhow::Result;
use common::types::LeaderboardSort;
use rusqlite::{Connection, OptionalExtension};

use super::whales::{whale_row_from, WHALE_COLS};
use crate::models::{
    fmt_opt_usd_compact, fmt_pnl, fmt_price, pnl_color, shorten_wallet, Page, PositionRow,
    TraderRow, WhaleRow,
};

/// Search results are a typeahead, not a browsing surface.
pub const SEARCH_LIMIT: i64 = 20;

/// Requires `traders t` left-joined with `watchlist w` so every caller
/// carries the watched flag.
const TRADER_COLS: &str =
    "t.id, t.proxy_wallet, t.user_name, t.verified_badge, t.total_pnl, \
     t.total_volume, t.portfolio_value, w.id IS NOT NULL";

pub(super) fn trader_row_from(row: &rusqlite::Row) -> rusqlite::Result<TraderRow> {
    let proxy_wallet: String = row.get(1)?;
    let user_name: Option<String> = row.get(2)?;
    let total_pnl: Option<f64> = row.get(4)?;
    let total_volume: Option<f64> = row.get(5)?;
    let portfolio: Option<f64> = row.get(6)?;
    let watched: i64 = row.get(7)?;
    let wallet_short = shorten_wallet(&proxy_wallet);
    Ok(TraderRow {
        id: row.get(0)?,
        display_name: user_name.unwrap_or_else(|| wallet_short.clone()),
        wallet_short,
        proxy_wallet,
        verified: row.get::<_, i64>(3)? != 0,
        total_pnl,
        pnl_display: fmt_pnl(total_pnl),
        pnl_color: pnl_color(total_pnl),
        total_volume,
        volume_display: fmt_opt_usd_compact(total_volume),
        portfolio_display: fmt_opt_usd_compact(portfolio),
        watched: watched != 0,
    })
}

/// One leaderboard page. Traders the collector has not priced yet (NULL in
/// the ranked column) are left off the board entirely rather than sorted
/// to the bottom.
pub fn top_traders(
    conn: &Connection,
    sort: LeaderboardSort,
    page: i64,
    page_size: i64,
) -> Result<Page<TraderRow>> {
    let col = sort.column();
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM traders WHERE {col} IS NOT NULL"),
        [],
        |row| row.get(0),
    )?;

    let page = page.max(1);
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRADER_COLS} FROM traders t \
         LEFT JOIN watchlist w ON w.trader_id = t.id \
         WHERE t.{col} IS NOT NULL \
         ORDER BY t.{col} DESC, t.id \
         LIMIT ?1 OFFSET ?2"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![page_size, (page - 1) * page_size],
            trader_row_from,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page::build(rows, total, page, page_size))
}

/// Case-insensitive name search, best P&L first.
pub fn search_traders(conn: &Connection, query: &str) -> Result<Vec<TraderRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TRADER_COLS} FROM traders t \
         LEFT JOIN watchlist w ON w.trader_id = t.id \
         WHERE t.user_name LIKE ?1 \
         ORDER BY (t.total_pnl IS NULL), t.total_pnl DESC, t.id \
         LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(
            rusqlite::params![format!("%{query}%"), SEARCH_LIMIT],
            trader_row_from,
        )?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn trader_by_id(conn: &Connection, id: i64) -> Result<Option<TraderRow>> {
    let trader = conn
        .query_row(
            &format!(
                "SELECT {TRADER_COLS} FROM traders t \
                 LEFT JOIN watchlist w ON w.trader_id = t.id \
                 WHERE t.id = ?1"
            ),
            [id],
            trader_row_from,
        )
        .optional()?;
    Ok(trader)
}

/// Positions from the most recent snapshot batch only.
///
/// The position collector rewrites a trader's whole book under one
/// `snapshot_time`, so the latest batch is found first and then its rows
/// are read; mixing rows across batches would double-count positions.
pub fn latest_positions(conn: &Connection, trader_id: i64) -> Result<Vec<PositionRow>> {
    let latest: Option<String> = conn.query_row(
        "SELECT MAX(snapshot_time) FROM trader_positions WHERE trader_id = ?1",
        [trader_id],
        |row| row.get(0),
    )?;
    let Some(snapshot_time) = latest else {
        return Ok(Vec::new());
    };

    let mut stmt = conn.prepare(
        "SELECT COALESCE(market_title, condition_id), outcome, size, avg_price, cur_price, \
                current_value, cash_pnl, percent_pnl, redeemable, snapshot_time \
         FROM trader_positions \
         WHERE trader_id = ?1 AND snapshot_time = ?2 \
         ORDER BY (current_value IS NULL), current_value DESC",
    )?;
    let rows = stmt
        .query_map(rusqlite::params![trader_id, snapshot_time], |row| {
            let size: Option<f64> = row.get(2)?;
            let cash_pnl: Option<f64> = row.get(6)?;
            let percent: Option<f64> = row.get(7)?;
            let value: Option<f64> = row.get(5)?;
            Ok(PositionRow {
                market_title: row.get(0)?,
                outcome: row.get(1)?,
                size_display: size.map_or_else(|| "-".to_string(), |s| format!("{s:.1}")),
                avg_price_display: fmt_price(row.get(3)?),
                cur_price_display: fmt_price(row.get(4)?),
                value_display: fmt_opt_usd_compact(value),
                pnl_display: fmt_pnl(cash_pnl),
                pnl_color: pnl_color(cash_pnl),
                cash_pnl,
                percent_display: percent
                    .map_or_else(|| "-".to_string(), |p| format!("{p:+.1}%")),
                redeemable: row.get::<_, i64>(8)? != 0,
                snapshot_time: row.get(9)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// This trader's recent whale-feed trades.
pub fn trades_for_trader(conn: &Connection, trader_id: i64, limit: i64) -> Result<Vec<WhaleRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WHALE_COLS} FROM whale_trades w \
         LEFT JOIN traders t ON t.id = w.trader_id \
         WHERE w.trader_id = ?1 \
         ORDER BY w.trade_timestamp DESC, w.id DESC LIMIT ?2"
    ))?;
    let rows = stmt
        .query_map(rusqlite::params![trader_id, limit], whale_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;

    fn seed(db: &common::db::Database) {
        db.conn
            .execute_batch(
                "INSERT INTO traders (proxy_wallet, user_name, verified_badge, total_pnl, total_volume, portfolio_value) VALUES
                    ('0x1111111111111111', 'alpha', 1, 50000.0, 2000000.0, 300000.0),
                    ('0x2222222222222222', 'beta', 0, 120000.0, 500000.0, 80000.0),
                    ('0x3333333333333333', NULL, 0, NULL, 900000.0, NULL),
                    ('0x4444444444444444', 'delta', 0, -2000.0, NULL, 1000.0);",
            )
            .unwrap();
    }

    #[test]
    fn test_leaderboard_skips_unranked_traders() {
        let db = test_db();
        seed(&db);

        let board = top_traders(&db.conn, LeaderboardSort::TotalPnl, 1, 50).unwrap();
        assert_eq!(board.total, 3);
        assert_eq!(board.rows[0].display_name, "beta");
        assert_eq!(board.rows[1].display_name, "alpha");
        assert_eq!(board.rows[2].pnl_color, "text-red-400");

        let by_volume = top_traders(&db.conn, LeaderboardSort::TotalVolume, 1, 50).unwrap();
        assert_eq!(by_volume.total, 3);
        assert_eq!(by_volume.rows[0].display_name, "alpha");
        // the nameless trader is ranked by volume and falls back to its wallet
        assert_eq!(by_volume.rows[1].display_name, "0x3333..3333");
    }

    #[test]
    fn test_leaderboard_carries_watch_flag() {
        let db = test_db();
        seed(&db);
        db.conn
            .execute("INSERT INTO watchlist (trader_id) VALUES (2)", [])
            .unwrap();

        let board = top_traders(&db.conn, LeaderboardSort::TotalPnl, 1, 50).unwrap();
        assert!(board.rows[0].watched);
        assert!(!board.rows[1].watched);
    }

    #[test]
    fn test_leaderboard_pagination() {
        let db = test_db();
        seed(&db);

        let page2 = top_traders(&db.conn, LeaderboardSort::TotalPnl, 2, 2).unwrap();
        assert_eq!(page2.total, 3);
        assert_eq!(page2.total_pages, 2);
        assert_eq!(page2.rows.len(), 1);
    }

    #[test]
    fn test_search_matches_name_and_caps_results() {
        let db = test_db();
        for i in 0..30 {
            db.conn
                .execute(
                    "INSERT INTO traders (proxy_wallet, user_name, total_pnl) VALUES (?1, ?2, ?3)",
                    rusqlite::params![format!("0x{i:040x}"), format!("whale{i}"), f64::from(i)],
                )
                .unwrap();
        }

        let hits = search_traders(&db.conn, "whale").unwrap();
        assert_eq!(hits.len() as i64, SEARCH_LIMIT);
        assert_eq!(hits[0].display_name, "whale29");

        assert!(search_traders(&db.conn, "nobody").unwrap().is_empty());
    }

    #[test]
    fn test_trader_by_id() {
        let db = test_db();
        seed(&db);

        let trader = trader_by_id(&db.conn, 1).unwrap().unwrap();
        assert_eq!(trader.display_name, "alpha");
        assert!(trader.verified);
        assert!(trader_by_id(&db.conn, 99).unwrap().is_none());
    }

    #[test]
    fn test_latest_positions_reads_only_newest_batch() {
        let db = test_db();
        seed(&db);
        db.conn
            .execute_batch(
                "INSERT INTO trader_positions (trader_id, proxy_wallet, condition_id, market_title, size, current_value, cash_pnl, snapshot_time) VALUES
                    (1, '0x1111111111111111', 'c-1', 'Old position', 10.0, 5.0, -1.0, '2026-08-01 00:00:00'),
                    (1, '0x1111111111111111', 'c-1', 'BTC 100k', 10.0, 8.0, 2.0, '2026-08-20 00:00:00'),
                    (1, '0x1111111111111111', 'c-2', 'Fed cuts', 500.0, 150.0, 30.0, '2026-08-20 00:00:00'),
                    (2, '0x2222222222222222', 'c-9', 'Other trader', 1.0, 1.0, 0.0, '2026-08-21 00:00:00');",
            )
            .unwrap();

        let positions = latest_positions(&db.conn, 1).unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].market_title, "Fed cuts");
        assert_eq!(positions[1].market_title, "BTC 100k");
        assert_eq!(positions[1].pnl_display, "+$2.00");

        assert!(latest_positions(&db.conn, 4).unwrap().is_empty());
    }

    #[test]
    fn test_trades_for_trader_only_theirs() {
        let db = test_db();
        seed(&db);
        db.conn
            .execute_batch(
                "INSERT INTO whale_trades (trader_id, proxy_wallet, condition_id, side, usdc_size, trade_timestamp) VALUES
                    (1, '0x1111111111111111', 'c-1', 'BUY', 5000.0, 1700000200),
                    (1, '0x1111111111111111', 'c-2', 'SELL', 900.0, 1700000100),
                    (2, '0x2222222222222222', 'c-1', 'BUY', 100.0, 1700000300);",
            )
            .unwrap();

        let trades = trades_for_trader(&db.conn, 1, 50).unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].side, "BUY");
        assert_eq!(trades[1].side, "SELL");
    }
}
