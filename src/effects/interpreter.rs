//! Effect interpreter traits.
//!
//! These traits define how effects are executed:
//! - `HostInterpreter` runs hosting API effects (the GitHub backend lives in
//!   [`crate::github`])
//! - `JobScheduler` hands build causes to whatever runs the build
//!
//! The trait-based design enables mock interpreters for testing.

use std::future::Future;

use super::host::{HostEffect, HostResponse};
use crate::types::BuildCause;

/// Interprets hosting effects against a hosting API.
///
/// Implementations are constructed with a `RepoId`, so pull-request-level
/// effects executed through a single interpreter instance are scoped to that
/// repository.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockHost {
///     open: Vec<PullRequest>,
/// }
///
/// impl HostInterpreter for MockHost {
///     type Error = String;
///
///     async fn interpret(&self, effect: HostEffect) -> Result<HostResponse, Self::Error> {
///         match effect {
///             HostEffect::ListOpenPrs => Ok(HostResponse::PullRequests(self.open.clone())),
///             other => Err(format!("unexpected effect: {:?}", other)),
///         }
///     }
/// }
/// ```
pub trait HostInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a hosting effect and return its response.
    fn interpret(
        &self,
        effect: HostEffect,
    ) -> impl Future<Output = Result<HostResponse, Self::Error>> + Send;

    /// Whether `error` is expected to clear by the next poll.
    ///
    /// Transient failures are logged as warnings; everything else is an
    /// error that needs an operator.
    fn is_transient(&self, _error: &Self::Error) -> bool {
        false
    }
}

/// Starts builds.
pub trait JobScheduler {
    /// The error type returned by this scheduler.
    type Error;

    /// Submit `cause` for building.
    fn start_job(&self, cause: BuildCause)
    -> impl Future<Output = Result<(), Self::Error>> + Send;
}
