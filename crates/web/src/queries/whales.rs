//! Whale trade feed queries.

use anyhow::Result;
use common::types::TradeSide;
use rusqlite::Connection;

use crate::models::{fmt_epoch, fmt_opt_usd_compact, fmt_price, shorten_wallet, side_color, WhaleRow};

/// Shared column order for [`WhaleRow`] mappers; requires `whale_trades w`
/// joined with `traders t`.
pub(super) const WHALE_COLS: &str =
    "w.id, w.trader_id, w.proxy_wallet, t.user_name, \
     COALESCE(w.market_title, w.condition_id), w.side, w.size, w.price, \
     w.usdc_size, w.outcome, w.trade_timestamp";

pub(super) fn whale_row_from(row: &rusqlite::Row) -> rusqlite::Result<WhaleRow> {
    let proxy_wallet: String = row.get(2)?;
    let side: String = row.get(5)?;
    let size: Option<f64> = row.get(6)?;
    let price: Option<f64> = row.get(7)?;
    let usdc: Option<f64> = row.get(8)?;
    let ts: i64 = row.get(10)?;
    Ok(WhaleRow {
        id: row.get(0)?,
        trader_id: row.get(1)?,
        wallet_short: shorten_wallet(&proxy_wallet),
        trader_name: row.get(3)?,
        market_title: row.get(4)?,
        side_color: side_color(&side),
        side,
        size_display: size.map_or_else(|| "-".to_string(), |s| format!("{s:.1}")),
        price_display: fmt_price(price),
        usdc_display: fmt_opt_usd_compact(usdc),
        outcome: row.get(9)?,
        traded_at: fmt_epoch(ts),
    })
}

#[derive(Default)]
pub struct WhaleFilter {
    pub side: Option<TradeSide>,
    pub min_usdc: Option<f64>,
}

/// Recent whale trades, newest first.
pub fn list_whale_trades(
    conn: &Connection,
    filter: &WhaleFilter,
    limit: i64,
) -> Result<Vec<WhaleRow>> {
    let mut sql = format!(
        "SELECT {WHALE_COLS} FROM whale_trades w \
         LEFT JOIN traders t ON t.id = w.trader_id WHERE 1=1"
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(side) = filter.side {
        sql.push_str(&format!(" AND w.side = ?{}", params.len() + 1));
        params.push(Box::new(side.as_str()));
    }
    if let Some(min_usdc) = filter.min_usdc {
        sql.push_str(&format!(" AND w.usdc_size >= ?{}", params.len() + 1));
        params.push(Box::new(min_usdc));
    }
    sql.push_str(&format!(
        " ORDER BY w.trade_timestamp DESC, w.id DESC LIMIT ?{}",
        params.len() + 1
    ));
    params.push(Box::new(limit));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), whale_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Trades in the last rolling 24 hours. Trade timestamps are unix epochs
/// from the Polymarket feed, so the bound is computed in epoch seconds.
pub fn whale_count_since_24h(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM whale_trades \
         WHERE trade_timestamp >= CAST(strftime('%s', 'now') AS INTEGER) - 86400",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;
    use chrono::Utc;

    fn seed(db: &common::db::Database) {
        let now = Utc::now().timestamp();
        db.conn
            .execute_batch(&format!(
                "INSERT INTO traders (proxy_wallet, user_name) VALUES ('0xaaa0000000000000', 'bigwhale');
                 INSERT INTO whale_trades (trader_id, proxy_wallet, condition_id, market_title, side, size, price, usdc_size, trade_timestamp) VALUES
                    (1, '0xaaa0000000000000', 'c-1', 'BTC 100k', 'BUY', 10000.0, 0.62, 6200.0, {recent}),
                    (1, '0xaaa0000000000000', 'c-2', 'Fed cuts', 'SELL', 2000.0, 0.31, 620.0, {older}),
                    (NULL, '0xbbb0000000000000', 'c-1', 'BTC 100k', 'BUY', 800.0, 0.60, 480.0, {ancient});",
                recent = now - 3600,
                older = now - 7200,
                ancient = now - 200_000,
            ))
            .unwrap();
    }

    #[test]
    fn test_list_is_newest_first() {
        let db = test_db();
        seed(&db);

        let rows = list_whale_trades(&db.conn, &WhaleFilter::default(), 100).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].usdc_display, "$6.2K");
        assert_eq!(rows[0].trader_name.as_deref(), Some("bigwhale"));
        assert!(rows[2].trader_name.is_none());
    }

    #[test]
    fn test_side_and_size_filters() {
        let db = test_db();
        seed(&db);

        let buys = list_whale_trades(
            &db.conn,
            &WhaleFilter {
                side: Some(TradeSide::Buy),
                min_usdc: None,
            },
            100,
        )
        .unwrap();
        assert_eq!(buys.len(), 2);
        assert!(buys.iter().all(|t| t.side == "BUY"));

        let big = list_whale_trades(
            &db.conn,
            &WhaleFilter {
                side: None,
                min_usdc: Some(1000.0),
            },
            100,
        )
        .unwrap();
        assert_eq!(big.len(), 1);
    }

    #[test]
    fn test_count_since_24h_uses_rolling_window() {
        let db = test_db();
        seed(&db);
        // recent + older fall inside the window, ancient does not
        assert_eq!(whale_count_since_24h(&db.conn).unwrap(), 2);
    }
}
