//! Route table and shared request state.

pub mod actions;
pub mod pages;
pub mod partials;

use axum::routing::{get, post};
use axum::Router;
use common::db::AsyncDb;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub db: AsyncDb,
    pub cfg: common::config::Dashboard,
    pub prom: PrometheusHandle,
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::overview))
        .route("/markets", get(pages::markets))
        .route("/markets/{id}", get(pages::market_detail))
        .route("/pairs", get(pages::pairs))
        .route("/alerts", get(pages::alerts))
        .route("/insights", get(pages::insights))
        .route("/insights/{id}", get(pages::insight_detail))
        .route("/agents", get(pages::agents))
        .route("/whales", get(pages::whales))
        .route("/leaderboard", get(pages::leaderboard))
        .route("/traders/{id}", get(pages::trader_detail))
        .route("/watchlist", get(pages::watchlist))
        .route("/metrics", get(pages::metrics_endpoint))
        .route("/partials/stats", get(partials::stats))
        .route("/partials/agents", get(partials::agents))
        .route("/partials/alerts", get(partials::alerts))
        .route("/partials/movers", get(partials::movers))
        .route("/traders/{id}/watch", post(actions::toggle_watch))
        .route("/alerts/{id}/ack", post(actions::ack_alert))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_cfg() -> common::config::Dashboard {
        common::config::Dashboard {
            page_size: 50,
            smart_filter_limit: 50,
            price_history_limit: 500,
            alerts_limit: 100,
            whales_limit: 100,
            insights_limit: 20,
        }
    }

    /// File-backed store like production; the TempDir guard keeps it alive
    /// for the duration of the test.
    async fn test_app() -> (Router, Arc<AppState>, TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dashboard.db");
        let db = AsyncDb::open(path.to_str().unwrap()).await.unwrap();
        let state = Arc::new(AppState {
            db,
            cfg: test_cfg(),
            prom: crate::metrics::init_global(),
        });
        (create_router(state.clone()), state, dir)
    }

    async fn seed_basic(state: &Arc<AppState>) {
        state
            .db
            .call(|conn| {
                conn.execute_batch(
                    "INSERT INTO markets (platform, platform_id, title, category, status, yes_price, volume) VALUES
                        ('polymarket', 'pm-1', 'Will BTC hit 100k', 'Crypto', 'active', 0.62, 50000.0),
                        ('kalshi', 'ks-1', 'Fed cuts rates in March', 'Economics', 'active', 0.31, 9000.0);
                     INSERT INTO traders (proxy_wallet, user_name, total_pnl, total_volume) VALUES
                        ('0x1111111111111111', 'alpha', 50000.0, 2000000.0);
                     INSERT INTO alerts (alert_type, severity, market_id, title) VALUES
                        ('price_move', 'warning', 1, 'BTC moved 10 points');
                     INSERT INTO insights (report_type, title, content) VALUES
                        ('briefing', 'Morning briefing', 'Quiet overnight.');",
                )?;
                Ok(())
            })
            .await
            .unwrap();
    }

    async fn get_response(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    async fn post_response(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .uri(uri)
                    .method("POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_overview_polls_partials() {
        let (app, _state, _guard) = test_app().await;
        let (status, html) = get_response(app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("hx-get=\"/partials/stats\""));
        assert!(html.contains("hx-get=\"/partials/agents\""));
        assert!(html.contains("hx-get=\"/partials/alerts\""));
        assert!(html.contains("hx-get=\"/partials/movers\""));
        assert!(html.contains("htmx.org"));
        assert!(html.contains("tailwindcss"));
    }

    #[tokio::test]
    async fn test_all_pages_return_200_on_empty_store() {
        let routes = [
            "/",
            "/markets",
            "/pairs",
            "/alerts",
            "/insights",
            "/agents",
            "/whales",
            "/leaderboard",
            "/watchlist",
            "/partials/stats",
            "/partials/agents",
            "/partials/alerts",
            "/partials/movers",
        ];
        for route in routes {
            let (app, _state, _guard) = test_app().await;
            let (status, _) = get_response(app, route).await;
            assert_eq!(status, StatusCode::OK, "route {route} did not return 200");
        }
    }

    #[tokio::test]
    async fn test_markets_page_lists_and_filters() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = get_response(app.clone(), "/markets").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Will BTC hit 100k"));
        assert!(html.contains("Fed cuts rates in March"));

        let (_, filtered) = get_response(app, "/markets?platform=kalshi").await;
        assert!(filtered.contains("Fed cuts rates in March"));
        assert!(!filtered.contains("Will BTC hit 100k"));
    }

    #[tokio::test]
    async fn test_markets_search_narrows_results() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (_, html) = get_response(app, "/markets?q=BTC").await;
        assert!(html.contains("Will BTC hit 100k"));
        assert!(!html.contains("Fed cuts rates in March"));
    }

    #[tokio::test]
    async fn test_smart_filter_unknown_key_renders_empty() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = get_response(app, "/markets?smart=most_random").await;
        assert_eq!(status, StatusCode::OK);
        assert!(!html.contains("Will BTC hit 100k"));
    }

    #[tokio::test]
    async fn test_smart_filter_near_5050() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;
        state
            .db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO markets (platform, platform_id, title, status, yes_price, volume)
                     VALUES ('polymarket', 'pm-5050', 'Coin flip market', 'active', 0.50, 10.0)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let (_, html) = get_response(app, "/markets?smart=near_5050").await;
        assert!(html.contains("Coin flip market"));
        assert!(!html.contains("Will BTC hit 100k"));
    }

    #[tokio::test]
    async fn test_market_detail_and_not_found() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;
        state
            .db
            .call(|conn| {
                conn.execute(
                    "INSERT INTO price_snapshots (market_id, yes_price, best_bid, best_ask, spread)
                     VALUES (1, 0.62, 0.61, 0.63, 0.02)",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let (status, html) = get_response(app.clone(), "/markets/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Will BTC hit 100k"));
        assert!(html.contains("Price history"));
        assert!(html.contains("Latest quote"));

        let (status, _) = get_response(app, "/markets/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_insight_detail_and_not_found() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = get_response(app.clone(), "/insights/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Morning briefing"));
        assert!(html.contains("Quiet overnight."));

        let (status, _) = get_response(app, "/insights/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_trader_profile_shows_watch_button() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = get_response(app.clone(), "/traders/1").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("alpha"));
        assert!(html.contains("/traders/1/watch"));

        let (status, _) = get_response(app, "/traders/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_watch_toggle_round_trip() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = post_response(app.clone(), "/traders/1/watch").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Unwatch"));

        let (_, html) = post_response(app.clone(), "/traders/1/watch").await;
        assert!(!html.contains("Unwatch"));
        assert!(html.contains("Watch"));

        let (status, _) = post_response(app, "/traders/999/watch").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ack_alert_marks_row() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, _) = post_response(app.clone(), "/alerts/1/ack").await;
        assert_eq!(status, StatusCode::OK);

        let count: i64 = state
            .db
            .call(|conn| {
                Ok(conn.query_row(
                    "SELECT COUNT(*) FROM alerts WHERE acknowledged = 0",
                    [],
                    |row| row.get(0),
                )?)
            })
            .await
            .unwrap();
        assert_eq!(count, 0);

        let (status, _) = post_response(app, "/alerts/999/ack").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_leaderboard_lists_traders() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (status, html) = get_response(app.clone(), "/leaderboard").await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("alpha"));

        let (_, html) = get_response(app, "/leaderboard?q=alp").await;
        assert!(html.contains("alpha"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint_renders_prometheus_text() {
        let (app, _state, _guard) = test_app().await;
        let (status, body) = get_response(app, "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("dashboard_web_build_info"));
    }

    #[tokio::test]
    async fn test_partial_stats_counts_markets() {
        let (app, state, _guard) = test_app().await;
        seed_basic(&state).await;

        let (_, html) = get_response(app, "/partials/stats").await;
        assert!(html.contains("Markets"));
    }
}
