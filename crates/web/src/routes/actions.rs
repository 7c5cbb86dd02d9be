//! POST handlers for the two writes the dashboard owns: the trader
//! watchlist toggle and alert acknowledgement. Both respond with the
//! fragment htmx swaps in place of the control that fired the request.

use askama::Template;
use axum::extract::{Path, State};
use axum::response::Html;
use std::sync::Arc;

use crate::error::{WebError, WebResult};
use crate::models::AlertRow;
use crate::queries;
use crate::queries::watchlist::WatchState;
use crate::routes::AppState;

#[derive(Template)]
#[template(path = "partials/watch_button.html")]
struct WatchButtonTemplate {
    trader_id: i64,
    watched: bool,
}

#[derive(Template)]
#[template(path = "partials/alert_row.html")]
struct AlertRowTemplate {
    alert: AlertRow,
}

pub async fn toggle_watch(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let Some(new_state) = state
        .db
        .call_named("toggle_watch", move |conn| {
            queries::watchlist::toggle_watch(conn, id)
        })
        .await?
    else {
        return Err(WebError::NotFound);
    };

    let watched = matches!(new_state, WatchState::Watched);
    tracing::info!(trader_id = id, watched, "watchlist toggled");
    Ok(Html(
        WatchButtonTemplate {
            trader_id: id,
            watched,
        }
        .render()?,
    ))
}

pub async fn ack_alert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> WebResult<Html<String>> {
    let alert = state
        .db
        .call_named("ack_alert", move |conn| {
            if !queries::alerts::acknowledge_alert(conn, id)? {
                return Ok(None);
            }
            queries::alerts::alert_by_id(conn, id)
        })
        .await?;
    let Some(alert) = alert else {
        return Err(WebError::NotFound);
    };
    Ok(Html(AlertRowTemplate { alert }.render()?))
}
