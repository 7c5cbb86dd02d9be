use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn describe() {
    describe_gauge!(
        "dashboard_web_build_info",
        "Build info for the market dashboard (value is always 1)."
    );
    describe_histogram!(
        "dashboard_db_query_latency_ms",
        "Wall-clock latency of named SQLite operations, labelled by op and status."
    );
    describe_counter!(
        "dashboard_db_query_errors_total",
        "Failed SQLite operations, labelled by op."
    );
    describe_counter!(
        "dashboard_page_hits_total",
        "Full page renders, labelled by page."
    );
}

/// Install the global Prometheus recorder exactly once and return a handle
/// for rendering `/metrics`. Concurrent callers block on the first install,
/// which keeps parallel tests off the "recorder already installed" error.
/// The `OnceLock` closure cannot propagate, and a failed install at boot is
/// fatal anyway, so this panics instead of returning `Result`.
///
/// `install_recorder` expects the caller to run upkeep periodically; we run
/// it opportunistically on each `/metrics` request.
pub fn init_global() -> PrometheusHandle {
    let handle = PROM_HANDLE.get_or_init(|| {
        describe();

        PrometheusBuilder::new()
            .install_recorder()
            .expect("failed to install Prometheus recorder")
    });

    // Stable build info gauge; Grafana joins on job/instance for the rest.
    let git_sha = std::env::var("GIT_SHA").unwrap_or_else(|_| "unknown".to_string());
    ::metrics::gauge!(
        "dashboard_web_build_info",
        "version" => env!("CARGO_PKG_VERSION"),
        "git_sha" => git_sha,
    )
    .set(1.0);

    handle.clone()
}

/// Count a full page render. Partial fetches are deliberately excluded so
/// the counter tracks human navigation, not htmx polling.
pub fn page_hit(page: &'static str) {
    ::metrics::counter!("dashboard_page_hits_total", "page" => page).increment(1);
}
