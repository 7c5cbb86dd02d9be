//! Agent run log queries for the status page.

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{agent_status_color, AgentRow};

const AGENT_COLS: &str =
    "agent_name, status, started_at, completed_at, duration_seconds, items_processed, \
     summary, error";

fn agent_row_from(row: &rusqlite::Row) -> rusqlite::Result<AgentRow> {
    let status: String = row.get(1)?;
    let duration: Option<f64> = row.get(4)?;
    let items: Option<i64> = row.get(5)?;
    Ok(AgentRow {
        agent_name: row.get(0)?,
        status_color: agent_status_color(&status),
        status,
        started_at: row.get(2)?,
        completed_at: row.get(3)?,
        duration_display: duration.map_or_else(|| "-".to_string(), |d| format!("{d:.1}s")),
        items_display: items.map_or_else(|| "-".to_string(), |n| n.to_string()),
        summary: row.get(6)?,
        error: row.get(7)?,
    })
}

/// The most recent run of every agent, ordered by agent name. Ties on
/// started_at (same-second restarts) resolve to the newer row.
pub fn latest_agent_runs(conn: &Connection) -> Result<Vec<AgentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AGENT_COLS} FROM agent_logs a \
         WHERE a.id = (SELECT l.id FROM agent_logs l \
                       WHERE l.agent_name = a.agent_name \
                       ORDER BY l.started_at DESC, l.id DESC LIMIT 1) \
         ORDER BY a.agent_name"
    ))?;
    let rows = stmt
        .query_map([], agent_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Raw tail of the run log, newest first.
pub fn recent_agent_runs(conn: &Connection, limit: i64) -> Result<Vec<AgentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {AGENT_COLS} FROM agent_logs ORDER BY started_at DESC, id DESC LIMIT ?1"
    ))?;
    let rows = stmt
        .query_map([limit], agent_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
