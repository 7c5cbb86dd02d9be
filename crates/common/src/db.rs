use anyhow::Result;
use rusqlite::Connection;

pub struct Database {
    pub conn: Connection,
}

/// Async database wrapper around `tokio_rusqlite::Connection`.
///
/// Runs all SQLite operations on a dedicated background thread via
/// `tokio_rusqlite`, keeping the Tokio runtime cooperative. Clone is
/// cheap (shared mpsc sender to the background thread).
#[derive(Clone)]
pub struct AsyncDb {
    conn: tokio_rusqlite::Connection,
}

impl AsyncDb {
    /// Open a database at `path`, set PRAGMAs (WAL, foreign keys, busy_timeout),
    /// and run migrations, all on the background thread.
    pub async fn open(path: &str) -> Result<Self> {
        let conn = tokio_rusqlite::Connection::open(path).await?;

        // Startup migrations require a write lock. The collector agents write to
        // the same file, so at boot we can race their transactions (or an admin
        // sqlite3 session). If we hard-fail on `database is locked`, systemd will
        // crash-loop. Instead we retry migrations with backoff until the lock
        // clears, using a short SQLite busy_timeout per attempt so the backoff
        // lives in Rust.
        let mut backoff = std::time::Duration::from_secs(1);
        let max_backoff = std::time::Duration::from_secs(30);
        let max_total_wait = std::time::Duration::from_secs(10 * 60);
        let start = std::time::Instant::now();

        loop {
            let res = conn
                .call(|conn| -> std::result::Result<(), rusqlite::Error> {
                    conn.busy_timeout(std::time::Duration::from_secs(1))?;
                    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
                    conn.execute_batch(SCHEMA)?;
                    migrate_markets_subcategory(conn)?;
                    // For normal runtime operations we still want a longer busy_timeout.
                    conn.busy_timeout(std::time::Duration::from_secs(30))?;
                    Ok(())
                })
                .await;

            match res {
                Ok(()) => break,
                Err(tokio_rusqlite::Error::Error(err)) => {
                    let is_locked = matches!(
                        err,
                        rusqlite::Error::SqliteFailure(
                            rusqlite::ffi::Error {
                                code: rusqlite::ffi::ErrorCode::DatabaseBusy
                                    | rusqlite::ffi::ErrorCode::DatabaseLocked,
                                ..
                            },
                            _,
                        )
                    );
                    if !is_locked {
                        return Err(
                            anyhow::Error::from(err).context("AsyncDb::open: migration failed")
                        );
                    }

                    if start.elapsed() >= max_total_wait {
                        return Err(anyhow::Error::from(err).context(
                            "AsyncDb::open: migration failed (database stayed locked too long)",
                        ));
                    }

                    tracing::warn!(
                        wait_for = ?backoff,
                        "AsyncDb::open: database is locked; retrying migrations"
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(max_backoff);
                }
                Err(other) => return Err(anyhow::anyhow!("AsyncDb::open: {other}")),
            }
        }

        Ok(Self { conn })
    }

    /// Run a closure on the background SQLite thread and return the result.
    ///
    /// The closure receives `&mut rusqlite::Connection` and can perform
    /// arbitrary sync SQLite operations. The result is sent back via oneshot
    /// channel.
    pub async fn call<F, R>(&self, function: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn.call(move |conn| function(conn)).await.map_err(
            |e: tokio_rusqlite::Error<anyhow::Error>| match e {
                tokio_rusqlite::Error::ConnectionClosed => {
                    anyhow::anyhow!("database connection closed")
                }
                tokio_rusqlite::Error::Close((_, err)) => {
                    anyhow::anyhow!("database close error: {err}")
                }
                tokio_rusqlite::Error::Error(err) => err,
                other => anyhow::anyhow!("database error: {other}"),
            },
        )
    }

    /// Like [`Self::call`], but records Prometheus metrics for DB latency and errors.
    ///
    /// This measures the full wall-clock time of the operation, including queueing
    /// on the dedicated SQLite thread and execution of all SQL in the closure.
    pub async fn call_named<F, R>(&self, op: &'static str, function: F) -> Result<R>
    where
        F: FnOnce(&mut rusqlite::Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let start = std::time::Instant::now();
        let res = self.call(function).await;
        let ms = start.elapsed().as_secs_f64() * 1000.0;

        match &res {
            Ok(_) => {
                metrics::histogram!(
                    "dashboard_db_query_latency_ms",
                    "op" => op,
                    "status" => "ok"
                )
                .record(ms);
            }
            Err(_) => {
                metrics::histogram!(
                    "dashboard_db_query_latency_ms",
                    "op" => op,
                    "status" => "err"
                )
                .record(ms);
                metrics::counter!("dashboard_db_query_errors_total", "op" => op).increment(1);
            }
        }

        res
    }
}

impl Database {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        // busy_timeout via the rusqlite API: makes SQLite retry for up to 30s
        // when the database is locked by another connection (the collectors).
        conn.busy_timeout(std::time::Duration::from_secs(30))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    pub fn run_migrations(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        migrate_markets_subcategory(&self.conn).map_err(anyhow::Error::from)?;
        Ok(())
    }
}

/// Add subcategory to markets if missing (databases created before the
/// collectors started splitting Polymarket tags into category/subcategory).
fn migrate_markets_subcategory(conn: &Connection) -> std::result::Result<(), rusqlite::Error> {
    let has: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pragma_table_info('markets') WHERE name='subcategory'",
        [],
        |row| row.get(0),
    )?;
    if has == 0 {
        conn.execute("ALTER TABLE markets ADD COLUMN subcategory TEXT", [])?;
    }
    Ok(())
}

const SCHEMA: &str = r#"
-- Ownership contract: every table below is populated by the collector agents
-- that share this file. The dashboard reads them and writes exactly two
-- things: alerts.acknowledged, and rows in the watchlist table.
CREATE TABLE IF NOT EXISTS markets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    platform TEXT NOT NULL,            -- polymarket | kalshi
    platform_id TEXT NOT NULL,         -- native id on the platform (condition id for Polymarket)
    title TEXT NOT NULL,
    description TEXT,
    category TEXT,                     -- Politics, Sports, Crypto, ...
    subcategory TEXT,
    status TEXT NOT NULL DEFAULT 'active', -- active | resolved | closed
    yes_price REAL,                    -- implied probability, 0..1
    no_price REAL,
    volume REAL,
    liquidity REAL,
    close_time TEXT,                   -- free-form text straight from the platform API
    url TEXT,
    last_updated TEXT,
    raw_data TEXT,                     -- original API payload
    UNIQUE(platform, platform_id)
);

CREATE TABLE IF NOT EXISTS market_pairs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kalshi_market_id INTEGER REFERENCES markets(id),
    polymarket_market_id INTEGER REFERENCES markets(id),
    match_confidence REAL,             -- 0..1 from the matching agent
    match_reason TEXT,
    price_gap REAL,                    -- kalshi yes minus polymarket yes, signed
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    last_checked TEXT
);

CREATE TABLE IF NOT EXISTS price_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    market_id INTEGER NOT NULL REFERENCES markets(id),
    yes_price REAL,
    no_price REAL,
    volume REAL,
    open_interest REAL,
    best_bid REAL,
    best_ask REAL,
    spread REAL,
    timestamp TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS analysis_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    pair_id INTEGER REFERENCES market_pairs(id),
    analysis_type TEXT NOT NULL,
    confidence REAL,
    reasoning TEXT,
    recommendation TEXT,
    raw_response TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS alerts (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    alert_type TEXT NOT NULL,          -- price_move, arbitrage, volume_spike, closing_soon, keyword, whale_trade
    severity TEXT NOT NULL DEFAULT 'info', -- info | warning | critical
    market_id INTEGER REFERENCES markets(id),
    pair_id INTEGER REFERENCES market_pairs(id),
    title TEXT NOT NULL,
    message TEXT,
    data TEXT,                         -- JSON payload from the alerting agent
    acknowledged INTEGER NOT NULL DEFAULT 0,
    triggered_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS insights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    report_type TEXT NOT NULL,         -- briefing | alert_analysis | deep_dive
    title TEXT NOT NULL,
    content TEXT,                      -- markdown-ish body from the LLM
    markets_covered INTEGER,
    model_used TEXT,
    tokens_used INTEGER,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS agent_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_name TEXT NOT NULL,
    status TEXT NOT NULL,              -- success | error | running
    started_at TEXT NOT NULL DEFAULT (datetime('now')),
    completed_at TEXT,
    duration_seconds REAL,
    items_processed INTEGER,
    summary TEXT,
    error TEXT
);

CREATE TABLE IF NOT EXISTS traders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    proxy_wallet TEXT NOT NULL UNIQUE,
    user_name TEXT,
    profile_image TEXT,
    x_username TEXT,
    verified_badge INTEGER NOT NULL DEFAULT 0,
    total_pnl REAL,
    total_volume REAL,
    portfolio_value REAL,
    first_seen TEXT NOT NULL DEFAULT (datetime('now')),
    last_updated TEXT
);

CREATE TABLE IF NOT EXISTS whale_trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trader_id INTEGER REFERENCES traders(id),
    proxy_wallet TEXT NOT NULL,
    condition_id TEXT NOT NULL,        -- joins markets.platform_id for polymarket rows
    market_title TEXT,
    side TEXT NOT NULL,                -- BUY or SELL
    size REAL,
    price REAL,
    usdc_size REAL,                    -- notional in USDC
    outcome TEXT,
    outcome_index INTEGER,
    transaction_hash TEXT UNIQUE,
    trade_timestamp INTEGER NOT NULL,  -- unix epoch
    event_slug TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS trader_positions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trader_id INTEGER NOT NULL REFERENCES traders(id),
    proxy_wallet TEXT NOT NULL,
    condition_id TEXT NOT NULL,
    market_title TEXT,
    outcome TEXT,
    size REAL,
    avg_price REAL,
    initial_value REAL,
    current_value REAL,
    cash_pnl REAL,
    percent_pnl REAL,
    realized_pnl REAL,
    cur_price REAL,
    redeemable INTEGER NOT NULL DEFAULT 0,
    event_slug TEXT,
    snapshot_time TEXT NOT NULL        -- one batch of rows shares a snapshot_time
);

CREATE TABLE IF NOT EXISTS watchlist (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    trader_id INTEGER NOT NULL UNIQUE REFERENCES traders(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_markets_platform ON markets(platform);
CREATE INDEX IF NOT EXISTS idx_markets_status ON markets(status);
CREATE INDEX IF NOT EXISTS idx_markets_category ON markets(category);
CREATE INDEX IF NOT EXISTS idx_snapshots_market_time ON price_snapshots(market_id, timestamp);
CREATE INDEX IF NOT EXISTS idx_alerts_acknowledged ON alerts(acknowledged);
CREATE INDEX IF NOT EXISTS idx_alerts_triggered_at ON alerts(triggered_at);
CREATE INDEX IF NOT EXISTS idx_whale_trades_timestamp ON whale_trades(trade_timestamp);
CREATE INDEX IF NOT EXISTS idx_whale_trades_wallet ON whale_trades(proxy_wallet);
CREATE INDEX IF NOT EXISTS idx_whale_trades_condition ON whale_trades(condition_id);
CREATE INDEX IF NOT EXISTS idx_positions_trader_time ON trader_positions(trader_id, snapshot_time);
CREATE INDEX IF NOT EXISTS idx_positions_snapshot_time ON trader_positions(snapshot_time);
CREATE INDEX IF NOT EXISTS idx_traders_pnl ON traders(total_pnl DESC);
CREATE INDEX IF NOT EXISTS idx_traders_volume ON traders(total_volume DESC);
"#;
