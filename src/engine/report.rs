//! Per-cycle outcome reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::{BuildKey, PrId};

use super::decide::DecisionReason;

/// What happened to one pull request during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PrOutcome {
    /// A build was started.
    Triggered { reason: DecisionReason },

    /// No build was started.
    Skipped { reason: DecisionReason },

    /// Processing failed; the pull request is re-evaluated next cycle.
    Failed { error: String, transient: bool },
}

/// One line of a [`CycleReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrReport {
    pub pr: PrId,
    #[serde(flatten)]
    pub outcome: PrOutcome,
}

/// Summary of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub build_key: BuildKey,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub pull_requests: Vec<PrReport>,
}

impl CycleReport {
    pub fn begin(build_key: BuildKey) -> Self {
        CycleReport {
            build_key,
            started_at: Utc::now(),
            finished_at: None,
            pull_requests: Vec::new(),
        }
    }

    pub fn record(&mut self, pr: PrId, outcome: PrOutcome) {
        self.pull_requests.push(PrReport { pr, outcome });
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }

    pub fn fetched(&self) -> usize {
        self.pull_requests.len()
    }

    pub fn triggered(&self) -> usize {
        self.count(|o| matches!(o, PrOutcome::Triggered { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, PrOutcome::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, PrOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&PrOutcome) -> bool) -> usize {
        self.pull_requests
            .iter()
            .filter(|r| pred(&r.outcome))
            .count()
    }
}
