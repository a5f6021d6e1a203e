//! The build trigger engine.
//!
//! - [`decide`] computes, for one pull request and build key, whether to build.
//! - [`Orchestrator`] runs the decision across all open pull requests and
//!   performs the resulting side effects.

mod calls;
mod decide;
mod error;
mod orchestrator;
mod report;

pub use decide::{Decision, DecisionReason, LedgerPost, TriggerRules, decide};
pub use error::{CycleError, DecisionError, HostCallError, OrchestratorError};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use report::{CycleReport, PrOutcome, PrReport};
