//! Cross-platform pair and analysis queries.

use anyhow::Result;
use rusqlite::Connection;

use crate::models::{fmt_confidence, fmt_price, AnalysisRow, PairRow};

fn gap_color(gap: Option<f64>) -> String {
    match gap {
        Some(g) if g.abs() >= 0.05 => "text-red-400".to_string(),
        Some(g) if g.abs() >= 0.03 => "text-yellow-400".to_string(),
        Some(_) => "text-gray-400".to_string(),
        None => "text-gray-600".to_string(),
    }
}

/// All matched pairs, widest absolute gap first; pairs the checker has not
/// priced yet sort last. `min_gap` drops the noise below a threshold.
pub fn all_pairs(conn: &Connection, min_gap: Option<f64>) -> Result<Vec<PairRow>> {
    let mut sql = String::from(
        "SELECT p.id, p.kalshi_market_id, p.polymarket_market_id, k.title, m.title, \
                k.yes_price, m.yes_price, p.price_gap, p.match_confidence, p.match_reason, \
                p.last_checked \
         FROM market_pairs p \
         LEFT JOIN markets k ON k.id = p.kalshi_market_id \
         LEFT JOIN markets m ON m.id = p.polymarket_market_id \
         WHERE 1=1",
    );
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();
    if let Some(min_gap) = min_gap {
        sql.push_str(&format!(" AND ABS(p.price_gap) >= ?{}", params.len() + 1));
        params.push(Box::new(min_gap));
    }
    sql.push_str(" ORDER BY (p.price_gap IS NULL), ABS(p.price_gap) DESC, p.id");

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            let gap: Option<f64> = row.get(7)?;
            let confidence: Option<f64> = row.get(8)?;
            Ok(PairRow {
                id: row.get(0)?,
                kalshi_market_id: row.get(1)?,
                polymarket_market_id: row.get(2)?,
                kalshi_title: row.get(3)?,
                polymarket_title: row.get(4)?,
                kalshi_yes_display: fmt_price(row.get(5)?),
                polymarket_yes_display: fmt_price(row.get(6)?),
                price_gap: gap,
                gap_display: gap.map_or_else(|| "-".to_string(), |g| format!("{g:+.2}")),
                gap_color: gap_color(gap),
                confidence_display: fmt_confidence(confidence),
                match_reason: row.get(9)?,
                last_checked: row.get(10)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Most recent LLM analysis passes, for the side panel on the pairs page.
pub fn latest_analyses(conn: &Connection, limit: i64) -> Result<Vec<AnalysisRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, analysis_type, confidence, recommendation, created_at \
         FROM analysis_results ORDER BY created_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([limit], |row| {
            let confidence: Option<f64> = row.get(2)?;
            Ok(AnalysisRow {
                id: row.get(0)?,
                analysis_type: row.get(1)?,
                confidence_display: fmt_confidence(confidence),
                recommendation: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
