//! Last-cycle inspection endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::{AppState, LastCycle};

/// Returns what the poll loop last published.
///
/// # Response
///
/// - 200 OK with a [`LastCycle`] body once a cycle has run (even if it aborted)
/// - 404 Not Found before the first cycle
pub async fn last_cycle_handler(State(app_state): State<AppState>) -> Response {
    let last: LastCycle = app_state.last_cycle().await;
    if last.cycles == 0 {
        return (StatusCode::NOT_FOUND, "no cycle has run yet").into_response();
    }
    Json(last).into_response()
}
