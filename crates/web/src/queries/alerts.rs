//! Alert feed queries and the acknowledge write.

use anyhow::Result;
use common::types::Severity;
use rusqlite::Connection;

use crate::models::{severity_color, AlertRow};

#[derive(Default)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    pub alert_type: Option<String>,
    pub unacked_only: bool,
}

const ALERT_COLS: &str = "a.id, a.alert_type, a.severity, a.market_id, m.title, a.title, \
                          a.message, a.acknowledged, a.triggered_at";

fn alert_row_from(row: &rusqlite::Row) -> rusqlite::Result<AlertRow> {
    let severity: String = row.get(2)?;
    Ok(AlertRow {
        id: row.get(0)?,
        alert_type: row.get(1)?,
        severity_color: severity_color(&severity),
        severity,
        market_id: row.get(3)?,
        market_title: row.get(4)?,
        title: row.get(5)?,
        message: row.get(6)?,
        acknowledged: row.get::<_, i64>(7)? != 0,
        triggered_at: row.get(8)?,
    })
}

/// Recent alerts, newest first, joined with the market title where the
/// triggering agent recorded one.
pub fn list_alerts(conn: &Connection, filter: &AlertFilter, limit: i64) -> Result<Vec<AlertRow>> {
    let mut sql = format!(
        "SELECT {ALERT_COLS} FROM alerts a \
         LEFT JOIN markets m ON m.id = a.market_id \
         WHERE 1=1"
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(severity) = filter.severity {
        sql.push_str(&format!(" AND a.severity = ?{}", params.len() + 1));
        params.push(Box::new(severity.as_str()));
    }
    if let Some(ref alert_type) = filter.alert_type {
        sql.push_str(&format!(" AND a.alert_type = ?{}", params.len() + 1));
        params.push(Box::new(alert_type.clone()));
    }
    if filter.unacked_only {
        sql.push_str(" AND a.acknowledged = 0");
    }
    sql.push_str(&format!(
        " ORDER BY a.triggered_at DESC, a.id DESC LIMIT ?{}",
        params.len() + 1
    ));
    params.push(Box::new(limit));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), alert_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn alert_by_id(conn: &Connection, id: i64) -> Result<Option<AlertRow>> {
    use rusqlite::OptionalExtension;

    let sql = format!(
        "SELECT {ALERT_COLS} FROM alerts a \
         LEFT JOIN markets m ON m.id = a.market_id \
         WHERE a.id = ?1"
    );
    let row = conn
        .query_row(&sql, [id], alert_row_from)
        .optional()?;
    Ok(row)
}

/// Mark an alert as seen. Returns whether the id existed; acknowledging an
/// already-acknowledged alert is a harmless repeat, not an error.
pub fn acknowledge_alert(conn: &Connection, id: i64) -> Result<bool> {
    let changed = conn.execute("UPDATE alerts SET acknowledged = 1 WHERE id = ?1", [id])?;
    Ok(changed > 0)
}

pub fn unacked_alert_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM alerts WHERE acknowledged = 0",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;

    fn seed(db: &common::db::Database) {
        db.conn
            .execute_batch(
                "INSERT INTO markets (platform, platform_id, title) VALUES ('polymarket', 'pm-1', 'BTC 100k');
                 INSERT INTO alerts (alert_type, severity, market_id, title, acknowledged, triggered_at) VALUES
                    ('price_move', 'warning', 1, 'BTC moved 10 points', 0, '2026-08-24 10:00:00'),
                    ('arbitrage', 'critical', NULL, 'Wide gap on rates pair', 0, '2026-08-24 11:00:00'),
                    ('whale_trade', 'info', 1, 'Whale bought 50k', 1, '2026-08-23 09:00:00');",
            )
            .unwrap();
    }

    #[test]
    fn test_list_newest_first_with_market_titles() {
        let db = test_db();
        seed(&db);

        let alerts = list_alerts(&db.conn, &AlertFilter::default(), 100).unwrap();
        assert_eq!(alerts.len(), 3);
        assert_eq!(alerts[0].title, "Wide gap on rates pair");
        assert!(alerts[0].market_title.is_none());
        assert_eq!(alerts[1].market_title.as_deref(), Some("BTC 100k"));
    }

    #[test]
    fn test_filters() {
        let db = test_db();
        seed(&db);

        let critical = list_alerts(
            &db.conn,
            &AlertFilter {
                severity: Some(Severity::Critical),
                ..Default::default()
            },
            100,
        )
        .unwrap();
        assert_eq!(critical.len(), 1);

        let whale = list_alerts(
            &db.conn,
            &AlertFilter {
                alert_type: Some("whale_trade".to_string()),
                ..Default::default()
            },
            100,
        )
        .unwrap();
        assert_eq!(whale.len(), 1);
        assert!(whale[0].acknowledged);

        let unacked = list_alerts(
            &db.conn,
            &AlertFilter {
                unacked_only: true,
                ..Default::default()
            },
            100,
        )
        .unwrap();
        assert_eq!(unacked.len(), 2);
    }

    #[test]
    fn test_alert_by_id() {
        let db = test_db();
        seed(&db);

        let alert = alert_by_id(&db.conn, 1).unwrap().unwrap();
        assert_eq!(alert.title, "BTC moved 10 points");
        assert_eq!(alert.market_title.as_deref(), Some("BTC 100k"));
        assert!(alert_by_id(&db.conn, 999).unwrap().is_none());
    }

    #[test]
    fn test_acknowledge_is_idempotent() {
        let db = test_db();
        seed(&db);

        assert_eq!(unacked_alert_count(&db.conn).unwrap(), 2);
        assert!(acknowledge_alert(&db.conn, 1).unwrap());
        assert_eq!(unacked_alert_count(&db.conn).unwrap(), 1);

        // second ack of the same alert succeeds and changes nothing
        assert!(acknowledge_alert(&db.conn, 1).unwrap());
        assert_eq!(unacked_alert_count(&db.conn).unwrap(), 1);

        assert!(!acknowledge_alert(&db.conn, 999).unwrap());
    }
}
