//! Health check endpoint for liveness probes.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub repository: String,
    pub build_key: String,
}

/// Returns 200 with the repository and build key this instance serves.
///
/// # Example
///
/// ```ignore
/// GET /health HTTP/1.1
///
/// HTTP/1.1 200 OK
/// Content-Type: application/json
///
/// {"status":"ok","repository":"octocat/hello-world","build_key":"jenkins-app"}
/// ```
pub async fn health_handler(State(app_state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        repository: app_state.repo().to_string(),
        build_key: app_state.build_key().to_string(),
    })
}
