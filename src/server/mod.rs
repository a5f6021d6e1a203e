//! HTTP status server.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns 200 with the configured repository and build key
//! - `GET /api/v1/last-cycle` - Returns the most recent cycle as JSON

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;

use crate::engine::CycleReport;
use crate::types::{BuildKey, RepoId};

pub mod cycle;
pub mod health;

pub use cycle::last_cycle_handler;
pub use health::health_handler;

/// What the poll loop last published.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LastCycle {
    /// Cycles attempted since startup, including failed ones.
    pub cycles: u64,

    /// The most recent completed cycle.
    pub report: Option<CycleReport>,

    /// Why the most recent cycle aborted, if it did.
    pub error: Option<String>,
}

/// Shared application state.
///
/// Handed to every handler through axum's `State` extractor and to the poll
/// loop, which writes it once per cycle.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    repo: RepoId,
    build_key: BuildKey,
    last: RwLock<LastCycle>,
}

impl AppState {
    pub fn new(repo: RepoId, build_key: BuildKey) -> Self {
        AppState {
            inner: Arc::new(AppStateInner {
                repo,
                build_key,
                last: RwLock::new(LastCycle::default()),
            }),
        }
    }

    pub fn repo(&self) -> &RepoId {
        &self.inner.repo
    }

    pub fn build_key(&self) -> &BuildKey {
        &self.inner.build_key
    }

    /// Publishes a completed cycle and clears any previous cycle error.
    pub async fn record_cycle(&self, report: CycleReport) {
        let mut last = self.inner.last.write().await;
        last.cycles += 1;
        last.report = Some(report);
        last.error = None;
    }

    /// Records an aborted cycle. The previous report stays visible.
    pub async fn record_failure(&self, error: impl Into<String>) {
        let mut last = self.inner.last.write().await;
        last.cycles += 1;
        last.error = Some(error.into());
    }

    pub async fn last_cycle(&self) -> LastCycle {
        self.inner.last.read().await.clone()
    }
}

/// Builds the axum Router with all endpoints.
pub fn build_router(app_state: AppState) -> axum::Router {
    use axum::routing::get;

    axum::Router::new()
        .route("/api/v1/last-cycle", get(last_cycle_handler))
        .route("/health", get(health_handler))
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::PrOutcome;
    use crate::types::PrId;

    fn state() -> AppState {
        AppState::new(RepoId::new("octocat", "hello-world"), BuildKey::new("jenkins-app").unwrap())
    }

    #[tokio::test]
    async fn failure_keeps_previous_report() {
        let state = state();
        let mut report = CycleReport::begin(state.build_key().clone());
        report.record(
            PrId::new("1"),
            PrOutcome::Failed {
                error: "x".into(),
                transient: false,
            },
        );
        state.record_cycle(report.finish()).await;
        state.record_failure("list failed").await;

        let last = state.last_cycle().await;
        assert_eq!(last.cycles, 2);
        assert_eq!(last.error.as_deref(), Some("list failed"));
        assert_eq!(last.report.map(|r| r.fetched()), Some(1));
    }

    #[tokio::test]
    async fn success_clears_error() {
        let state = state();
        state.record_failure("list failed").await;
        state
            .record_cycle(CycleReport::begin(state.build_key().clone()).finish())
            .await;

        let last = state.last_cycle().await;
        assert_eq!(last.error, None);
        assert!(last.report.is_some());
    }
}
