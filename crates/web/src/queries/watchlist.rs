//! Trader watchlist reads and the toggle write.

use anyhow::Result;
use rusqlite::{Connection, OptionalExtension};

use crate::models::TraderRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Watched,
    Unwatched,
}

pub fn watch_state(conn: &Connection, trader_id: i64) -> Result<WatchState> {
    let row: Option<i64> = conn
        .query_row(
            "SELECT id FROM watchlist WHERE trader_id = ?1",
            [trader_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(if row.is_some() {
        WatchState::Watched
    } else {
        WatchState::Unwatched
    })
}

/// Flip the watch entry for a trader and return the new state, or `None`
/// when the trader id does not exist. A uniqueness conflict on the insert
/// means a concurrent toggle already created the row, so it counts as
/// success; deleting an already-deleted row is equally harmless.
pub fn toggle_watch(conn: &Connection, trader_id: i64) -> Result<Option<WatchState>> {
    let exists: Option<i64> = conn
        .query_row(
            "SELECT id FROM traders WHERE id = ?1",
            [trader_id],
            |row| row.get(0),
        )
        .optional()?;
    if exists.is_none() {
        return Ok(None);
    }

    match watch_state(conn, trader_id)? {
        WatchState::Watched => {
            conn.execute("DELETE FROM watchlist WHERE trader_id = ?1", [trader_id])?;
            Ok(Some(WatchState::Unwatched))
        }
        WatchState::Unwatched => {
            conn.execute(
                "INSERT INTO watchlist (trader_id) VALUES (?1) ON CONFLICT(trader_id) DO NOTHING",
                [trader_id],
            )?;
            Ok(Some(WatchState::Watched))
        }
    }
}

/// Watched traders, most recently added first.
pub fn watched_traders(conn: &Connection) -> Result<Vec<TraderRow>> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.proxy_wallet, t.user_name, t.verified_badge, t.total_pnl, \
                t.total_volume, t.portfolio_value, 1 \
         FROM traders t \
         JOIN watchlist w ON w.trader_id = t.id \
         ORDER BY w.created_at DESC, w.id DESC",
    )?;
    let rows = stmt
        .query_map([], super::traders::trader_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
