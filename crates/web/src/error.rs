//! Error boundary for the dashboard routes.
//!
//! Query failures are logged and collapsed into a generic 500 page; a render
//! never ships partial UI. Missing rows are a distinct 404 signal.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WebError {
    #[error("not found")]
    NotFound,
    #[error("template render failed: {0}")]
    Render(#[from] askama::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type WebResult<T> = std::result::Result<T, WebError>;

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Html(
                    "<!doctype html><html><body class=\"bg-gray-950 text-gray-200\">\
                     <p style=\"font-family:monospace;padding:2rem\">404: no such record. \
                     <a href=\"/\">back to overview</a></p></body></html>"
                        .to_string(),
                ),
            )
                .into_response(),
            Self::Render(err) => {
                tracing::error!(error = %err, "template render failed");
                generic_failure()
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "request failed");
                generic_failure()
            }
        }
    }
}

fn generic_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(
            "<!doctype html><html><body class=\"bg-gray-950 text-gray-200\">\
             <p style=\"font-family:monospace;padding:2rem\">something went wrong; \
             check the logs. <a href=\"/\">back to overview</a></p></body></html>"
                .to_string(),
        ),
    )
        .into_response()
}
