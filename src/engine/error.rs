//! Error types for the decision engine and orchestrator.

use thiserror::Error;

use crate::effects::HostResponse;
use crate::types::PrId;

/// A hosting call that failed or answered with the wrong response.
#[derive(Debug, Error)]
pub enum HostCallError {
    /// The interpreter reported an error.
    #[error("{effect} failed: {message}")]
    Api {
        effect: &'static str,
        message: String,
        transient: bool,
    },

    /// The interpreter answered with a response for a different effect.
    #[error("{effect} returned an unexpected response: {response:?}")]
    UnexpectedResponse {
        effect: &'static str,
        response: Box<HostResponse>,
    },
}

impl HostCallError {
    /// Returns true if the next poll is likely to succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, HostCallError::Api { transient: true, .. })
    }
}

/// Errors that prevent a trigger decision for one pull request.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The pull request has no source commit, so there is nothing to key the
    /// build status on.
    #[error("pull request {pr} has no source commit")]
    MissingSourceCommit { pr: PrId },

    /// A hosting call made while deciding failed.
    #[error(transparent)]
    Host(#[from] HostCallError),
}

/// Errors from processing one pull request in the orchestrator.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Decision(#[from] DecisionError),

    /// A side effect (ledger post, status update) failed.
    #[error(transparent)]
    Host(#[from] HostCallError),

    /// The job scheduler rejected the build.
    #[error("job scheduler error: {0}")]
    Scheduler(String),
}

impl OrchestratorError {
    /// Returns true if the failure came from a hosting call expected to clear
    /// by the next poll.
    pub fn is_transient(&self) -> bool {
        match self {
            OrchestratorError::Decision(DecisionError::Host(e)) | OrchestratorError::Host(e) => {
                e.is_transient()
            }
            _ => false,
        }
    }
}

/// Errors that abort a whole polling cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The open pull requests could not be listed.
    #[error("failed to list open pull requests: {0}")]
    ListPullRequests(#[source] HostCallError),

    /// Branch discovery for an SCM source failed.
    #[error("failed to discover branches of {repo}: {source}")]
    ScmDiscovery {
        repo: String,
        #[source]
        source: HostCallError,
    },
}
