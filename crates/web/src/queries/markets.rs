//! Market list and detail queries.

use anyhow::Result;
use common::types::{MarketStatus, Platform, SortKey};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{
    expiry_urgency, fmt_opt_usd_compact, fmt_price, liquidity_tier, platform_color, MarketDetail,
    MarketRow, Page,
};

/// Column order shared by every query that maps into [`MarketRow`].
pub(super) const MARKET_COLS: &str =
    "m.id, m.platform, m.title, m.category, m.status, m.yes_price, m.no_price, \
     m.volume, m.liquidity, m.close_time, m.url";

/// Filters shared by the count and the page query, so the envelope total
/// always agrees with the rows.
#[derive(Default)]
pub struct MarketFilter {
    pub platform: Option<Platform>,
    /// `None` means no status filter ("all"); the routes default to active.
    pub status: Option<MarketStatus>,
    pub category: Option<&'static str>,
    pub search: Option<String>,
}

fn filter_sql(filter: &MarketFilter) -> (String, Vec<Box<dyn rusqlite::types::ToSql>>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut params: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(platform) = filter.platform {
        sql.push_str(&format!(" AND m.platform = ?{}", params.len() + 1));
        params.push(Box::new(platform.as_str()));
    }
    if let Some(status) = filter.status {
        sql.push_str(&format!(" AND m.status = ?{}", params.len() + 1));
        params.push(Box::new(status.as_str()));
    }
    if let Some(category) = filter.category {
        sql.push_str(&format!(" AND m.category = ?{}", params.len() + 1));
        params.push(Box::new(category));
    }
    if let Some(ref search) = filter.search {
        sql.push_str(&format!(" AND m.title LIKE ?{}", params.len() + 1));
        params.push(Box::new(format!("%{search}%")));
    }

    (sql, params)
}

/// Map one row in [`MARKET_COLS`] order. Smart filters reuse this and then
/// fill in the `note` column from their extra SELECT columns.
pub(super) fn market_row_from(row: &rusqlite::Row) -> rusqlite::Result<MarketRow> {
    let platform: String = row.get(1)?;
    let yes_price: Option<f64> = row.get(5)?;
    let no_price: Option<f64> = row.get(6)?;
    let volume: Option<f64> = row.get(7)?;
    let liquidity: Option<f64> = row.get(8)?;
    Ok(MarketRow {
        id: row.get(0)?,
        platform_color: platform_color(&platform),
        platform,
        title: row.get(2)?,
        category: row.get(3)?,
        status: row.get(4)?,
        yes_price,
        yes_display: fmt_price(yes_price),
        no_display: fmt_price(no_price),
        volume,
        volume_display: fmt_opt_usd_compact(volume),
        liquidity_tier: liquidity_tier(volume, liquidity).to_string(),
        close_time: row.get(9)?,
        url: row.get(10)?,
        note: String::new(),
    })
}

pub fn count_markets(conn: &Connection, filter: &MarketFilter) -> Result<i64> {
    let (where_sql, params) = filter_sql(filter);
    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let total = conn.query_row(
        &format!("SELECT COUNT(*) FROM markets m{where_sql}"),
        param_refs.as_slice(),
        |row| row.get(0),
    )?;
    Ok(total)
}

/// One page of the market list. A page past the end comes back with no rows
/// but the real total, so the pagination links stay correct.
pub fn list_markets(
    conn: &Connection,
    filter: &MarketFilter,
    sort: SortKey,
    page: i64,
    page_size: i64,
) -> Result<Page<MarketRow>> {
    let total = count_markets(conn, filter)?;

    let (where_sql, mut params) = filter_sql(filter);
    let page = page.max(1);
    let order = sort.order_clause();

    let mut sql = format!("SELECT {MARKET_COLS} FROM markets m{where_sql} ORDER BY {order}");
    sql.push_str(&format!(" LIMIT ?{}", params.len() + 1));
    params.push(Box::new(page_size));
    sql.push_str(&format!(" OFFSET ?{}", params.len() + 1));
    params.push(Box::new((page - 1) * page_size));

    let param_refs: Vec<&dyn rusqlite::types::ToSql> = params.iter().map(AsRef::as_ref).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), market_row_from)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page::build(rows, total, page, page_size))
}

pub fn market_by_id(conn: &Connection, id: i64) -> Result<Option<MarketDetail>> {
    let detail = conn
        .query_row(
            &format!(
                "SELECT {MARKET_COLS}, m.description, m.subcategory, m.last_updated \
                 FROM markets m WHERE m.id = ?1"
            ),
            [id],
            |row| {
                let liquidity: Option<f64> = row.get(8)?;
                let market = market_row_from(row)?;
                Ok(MarketDetail {
                    expiry_urgency: expiry_urgency(market.close_time.as_deref()).to_string(),
                    row: market,
                    description: row.get(11)?,
                    subcategory: row.get(12)?,
                    liquidity_display: fmt_opt_usd_compact(liquidity),
                    last_updated: row.get(13)?,
                })
            },
        )
        .optional()?;
    Ok(detail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::test_support::test_db;

    fn seed(db: &common::db::Database) {
        db.conn
            .execute_batch(
                "INSERT INTO markets (platform, platform_id, title, category, status, yes_price, volume) VALUES
                    ('polymarket', 'pm-1', 'Will BTC hit 100k', 'Crypto', 'active', 0.62, 50000.0),
                    ('polymarket', 'pm-2', 'Fed cuts rates in March', 'Economics', 'active', 0.31, 120000.0),
                    ('kalshi', 'ks-1', 'BTC above 90k on Friday', 'Crypto', 'active', 0.55, 8000.0),
                    ('kalshi', 'ks-2', 'Hurricane makes landfall', 'Weather', 'closed', 0.97, 3000.0),
                    ('polymarket', 'pm-3', 'Election winner announced', 'Politics', 'resolved', 1.0, 900000.0);",
            )
            .unwrap();
    }

    #[test]
    fn test_list_defaults_to_volume_desc() {
        let db = test_db();
        seed(&db);

        let filter = MarketFilter::default();
        let page = list_markets(&db.conn, &filter, SortKey::default(), 1, 50).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.rows[0].title, "Election winner announced");
        assert_eq!(page.rows[1].title, "Fed cuts rates in March");
    }

    #[test]
    fn test_platform_and_status_filters_combine() {
        let db = test_db();
        seed(&db);

        let filter = MarketFilter {
            platform: Some(Platform::Kalshi),
            status: Some(MarketStatus::Active),
            ..Default::default()
        };
        let page = list_markets(&db.conn, &filter, SortKey::default(), 1, 50).unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].title, "BTC above 90k on Friday");
    }

    #[test]
    fn test_search_matches_title_substring() {
        let db = test_db();
        seed(&db);

        let filter = MarketFilter {
            search: Some("BTC".to_string()),
            ..Default::default()
        };
        let page = list_markets(&db.conn, &filter, SortKey::default(), 1, 50).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_category_filter() {
        let db = test_db();
        seed(&db);

        let filter = MarketFilter {
            category: Some("Crypto"),
            ..Default::default()
        };
        assert_eq!(count_markets(&db.conn, &filter).unwrap(), 2);
    }

    #[test]
    fn test_out_of_range_page_is_empty_with_real_total() {
        let db = test_db();
        seed(&db);

        let page = list_markets(&db.conn, &MarketFilter::default(), SortKey::default(), 99, 50)
            .unwrap();
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 5);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_pagination_splits_rows() {
        let db = test_db();
        seed(&db);

        let first = list_markets(&db.conn, &MarketFilter::default(), SortKey::TitleAsc, 1, 2)
            .unwrap();
        let second = list_markets(&db.conn, &MarketFilter::default(), SortKey::TitleAsc, 2, 2)
            .unwrap();
        assert_eq!(first.rows.len(), 2);
        assert_eq!(second.rows.len(), 2);
        assert_eq!(first.total_pages, 3);
        assert_ne!(first.rows[0].title, second.rows[0].title);
    }

    #[test]
    fn test_title_sort_is_alphabetical() {
        let db = test_db();
        seed(&db);

        let page = list_markets(&db.conn, &MarketFilter::default(), SortKey::TitleAsc, 1, 50)
            .unwrap();
        let titles: Vec<&str> = page.rows.iter().map(|r| r.title.as_str()).collect();
        let mut sorted = titles.clone();
        sorted.sort_unstable();
        assert_eq!(titles, sorted);
    }

    #[test]
    fn test_null_volume_sorts_last_on_default_sort() {
        let db = test_db();
        seed(&db);
        db.conn
            .execute(
                "INSERT INTO markets (platform, platform_id, title, status) VALUES
                 ('polymarket', 'pm-null', 'No volume yet', 'active')",
                [],
            )
            .unwrap();

        let page = list_markets(&db.conn, &MarketFilter::default(), SortKey::default(), 1, 50)
            .unwrap();
        assert_eq!(page.rows.last().unwrap().title, "No volume yet");
    }

    #[test]
    fn test_market_by_id() {
        let db = test_db();
        seed(&db);

        let detail = market_by_id(&db.conn, 1).unwrap().unwrap();
        assert_eq!(detail.row.title, "Will BTC hit 100k");
        assert_eq!(detail.row.yes_display, "0.62");
        assert_eq!(detail.row.liquidity_tier, "moderate");

        assert!(market_by_id(&db.conn, 9999).unwrap().is_none());
    }
}
