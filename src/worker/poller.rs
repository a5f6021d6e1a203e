//! The poll loop.

use std::fmt;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::effects::{HostInterpreter, JobScheduler};
use crate::engine::Orchestrator;
use crate::server::AppState;
use crate::types::{BuildKey, RepoId};

use super::poll::PollConfig;

/// Runs orchestrator cycles on a timer and publishes their reports.
pub struct Poller<H, J> {
    orchestrator: Orchestrator<H, J>,
    repo: RepoId,
    build_key: BuildKey,
    poll_config: PollConfig,
    status: AppState,
}

impl<H, J> Poller<H, J>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
    J: JobScheduler,
    J::Error: fmt::Display,
{
    pub fn new(
        orchestrator: Orchestrator<H, J>,
        poll_config: PollConfig,
        status: AppState,
    ) -> Self {
        Poller {
            orchestrator,
            repo: status.repo().clone(),
            build_key: status.build_key().clone(),
            poll_config,
            status,
        }
    }

    /// Polls until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between cycles; a cycle in flight runs to the
    /// end of its pull request list first.
    #[instrument(skip_all, fields(repo = %self.repo, build_key = %self.build_key))]
    pub async fn run(self, shutdown: CancellationToken) {
        info!("Poll loop started");

        let mut delay = self.poll_config.initial_poll_delay(&self.repo);
        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping poll loop");
                    break;
                }

                _ = tokio::time::sleep(delay) => {}
            }

            self.poll_once().await;
            delay = self.poll_config.poll_interval_with_jitter(&self.repo);
        }

        info!("Poll loop stopped");
    }

    /// Runs a single cycle and publishes its outcome.
    pub async fn poll_once(&self) {
        match self.orchestrator.run_cycle(&self.build_key).await {
            Ok(report) => self.status.record_cycle(report).await,
            Err(e) => {
                error!(error = %e, "Cycle aborted");
                self.status.record_failure(e.to_string()).await;
            }
        }
    }
}
