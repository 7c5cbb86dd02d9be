//! LLM research report queries.

use anyhow::Result;
use common::types::ReportType;
use rusqlite::{Connection, OptionalExtension};

use crate::models::{InsightDetail, InsightRow};

fn insight_row_from(row: &rusqlite::Row) -> rusqlite::Result<InsightRow> {
    let tokens: Option<i64> = row.get(5)?;
    Ok(InsightRow {
        id: row.get(0)?,
        report_type: row.get(1)?,
        title: row.get(2)?,
        markets_covered: row.get(3)?,
        model_used: row.get(4)?,
        tokens_display: tokens.map_or_else(|| "-".to_string(), |t| format!("{t} tokens")),
        created_at: row.get(6)?,
    })
}

/// Report list, newest first. The body stays out of the list query; some
/// deep dives run to tens of kilobytes.
pub fn list_insights(
    conn: &Connection,
    report_type: Option<ReportType>,
    limit: i64,
) -> Result<Vec<InsightRow>> {
    let mut sql = String::from(
        "SELECT id, report_type, title, markets_covered, model_used, tokens_used, created_at \
         FROM insights WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(report_type) = report_type {
        sql.push_str(&format!(" AND report_type = ?{}", params.len() + 1));
        params.push(Box::new(report_type.as_str()));
    }
    sql.push_str(&format!(
        " ORDER BY created_at DESC, id DESC LIMIT ?{}",
        params.len() + 1
    ));
    params.push(Box::new(limit));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), insight_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn insight_by_id(conn: &Connection, id: i64) -> Result<Option<InsightDetail>> {
    let detail = conn
        .query_row(
            "SELECT id, report_type, title, markets_covered, model_used, tokens_used, \
                    created_at, COALESCE(content, '') \
             FROM insights WHERE id = ?1",
            [id],
            |row| {
                Ok(InsightDetail {
                    row: insight_row_from(row)?,
                    content: row.get(7)?,
                })
            },
        )
        .optional()?;
    Ok(detail)
}
