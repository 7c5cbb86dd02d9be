//! Price snapshot history for the market detail page.

use anyhow::Result;
use common::types::TimeRange;
use rusqlite::{Connection, OptionalExtension};

use crate::models::{fmt_opt_usd_compact, fmt_price, SnapshotRow};

const SNAPSHOT_COLS: &str = "timestamp, yes_price, no_price, volume, spread, best_bid, best_ask";

fn snapshot_row_from(row: &rusqlite::Row) -> rusqlite::Result<SnapshotRow> {
    let yes: Option<f64> = row.get(1)?;
    let no: Option<f64> = row.get(2)?;
    let volume: Option<f64> = row.get(3)?;
    let spread: Option<f64> = row.get(4)?;
    let bid: Option<f64> = row.get(5)?;
    let ask: Option<f64> = row.get(6)?;
    Ok(SnapshotRow {
        timestamp: row.get(0)?,
        yes_price: yes,
        yes_display: fmt_price(yes),
        no_display: fmt_price(no),
        volume_display: fmt_opt_usd_compact(volume),
        spread_display: fmt_price(spread),
        best_bid_display: fmt_price(bid),
        best_ask_display: fmt_price(ask),
    })
}

/// Snapshots for one market inside the lookback window, newest first.
/// Snapshot timestamps are written by the collectors with `datetime('now')`,
/// so the window comparison happens entirely in SQLite.
pub fn price_history(
    conn: &Connection,
    market_id: i64,
    range: TimeRange,
    limit: i64,
) -> Result<Vec<SnapshotRow>> {
    let mut sql =
        format!("SELECT {SNAPSHOT_COLS} FROM price_snapshots WHERE market_id = ?1");
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = vec![Box::new(market_id)];

    if let Some(modifier) = range.sqlite_modifier() {
        sql.push_str(&format!(
            " AND timestamp >= datetime('now', ?{})",
            params.len() + 1
        ));
        params.push(Box::new(modifier));
    }
    sql.push_str(&format!(
        " ORDER BY timestamp DESC, id DESC LIMIT ?{}",
        params.len() + 1
    ));
    params.push(Box::new(limit));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), snapshot_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn latest_snapshot(conn: &Connection, market_id: i64) -> Result<Option<SnapshotRow>> {
    let snapshot = conn
        .query_row(
            &format!(
                "SELECT {SNAPSHOT_COLS} FROM price_snapshots \
                 WHERE market_id = ?1 ORDER BY timestamp DESC, id DESC LIMIT 1"
            ),
            [market_id],
            snapshot_row_from,
        )
        .optional()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;

    fn seed(db: &common::db::Database) {
        db.conn
            .execute_batch(
                "INSERT INTO markets (platform, platform_id, title) VALUES ('polymarket', 'pm-1', 'M');
                 INSERT INTO price_snapshots (market_id, yes_price, timestamp) VALUES
                    (1, 0.40, datetime('now', '-800 hours')),
                    (1, 0.50, datetime('now', '-48 hours')),
                    (1, 0.60, datetime('now', '-2 hours'));",
            )
            .unwrap();
    }

    #[test]
    fn test_range_bounds_the_window() {
        let db = test_db();
        seed(&db);

        assert_eq!(price_history(&db.conn, 1, TimeRange::H24, 500).unwrap().len(), 1);
        assert_eq!(price_history(&db.conn, 1, TimeRange::D7, 500).unwrap().len(), 2);
        assert_eq!(price_history(&db.conn, 1, TimeRange::D30, 500).unwrap().len(), 2);
        assert_eq!(price_history(&db.conn, 1, TimeRange::All, 500).unwrap().len(), 3);
    }

    #[test]
    fn test_newest_first_and_limit() {
        let db = test_db();
        seed(&db);

        let rows = price_history(&db.conn, 1, TimeRange::All, 2).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].yes_display, "0.60");
        assert_eq!(rows[1].yes_display, "0.50");
    }

    #[test]
    fn test_unknown_market_has_no_history() {
        let db = test_db();
        seed(&db);
        assert!(price_history(&db.conn, 42, TimeRange::All, 500).unwrap().is_empty());
    }

    #[test]
    fn test_latest_snapshot() {
        let db = test_db();
        seed(&db);

        let latest = latest_snapshot(&db.conn, 1).unwrap().unwrap();
        assert_eq!(latest.yes_display, "0.60");
        assert!(latest_snapshot(&db.conn, 42).unwrap().is_none());
    }
}
