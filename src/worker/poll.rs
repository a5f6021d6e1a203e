//! Poll pacing.
//!
//! The hosting platform is the only source of truth, so the trigger polls it.
//!
//! # Polling Strategy
//!
//! - **Poll interval**: 5 minutes by default (configurable via
//!   `PR_BUILD_TRIGGER_POLL_INTERVAL_SECS`)
//! - **Jitter**: 0-20% added so instances restarted together drift apart
//! - **Initial stagger**: Based on repo ID hash to distribute load

use std::hash::{Hash, Hasher};
use std::time::Duration;

use crate::types::RepoId;

/// Default poll interval (5 minutes).
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;

/// Default jitter percentage (0-100).
const DEFAULT_JITTER_PERCENT: u8 = 20;

/// Configuration for the poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between cycles.
    pub poll_interval: Duration,

    /// Jitter percentage to add to poll interval (0-100).
    ///
    /// Default: 20 (meaning 0-20% jitter).
    pub jitter_percent: u8,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PollConfig {
    /// Creates a new `PollConfig` with default values.
    pub fn new() -> Self {
        Self::with_interval(Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS))
    }

    pub fn with_interval(poll_interval: Duration) -> Self {
        PollConfig {
            poll_interval,
            jitter_percent: DEFAULT_JITTER_PERCENT,
        }
    }

    /// Returns the poll interval with jitter added for a specific repository.
    ///
    /// The jitter is deterministic based on the repo ID hash, so the same
    /// repository always gets the same interval.
    ///
    /// # Formula
    ///
    /// `interval * (1 + (hash(repo) % jitter_percent) / 100)`
    pub fn poll_interval_with_jitter(&self, repo: &RepoId) -> Duration {
        let jitter_factor = self.jitter_factor(repo);
        Duration::from_secs_f64(self.poll_interval.as_secs_f64() * jitter_factor)
    }

    /// Returns the delay before the first cycle for a specific repository.
    ///
    /// # Formula
    ///
    /// `hash(repo) % (poll_interval / 2)`
    pub fn initial_poll_delay(&self, repo: &RepoId) -> Duration {
        let hash = self.repo_hash(repo);
        let max_delay = self.poll_interval.as_secs() / 2;
        let delay_secs = hash % max_delay.max(1);
        Duration::from_secs(delay_secs)
    }

    /// Returns a value between 1.0 and 1.0 + (jitter_percent / 100).
    fn jitter_factor(&self, repo: &RepoId) -> f64 {
        if self.jitter_percent == 0 {
            return 1.0;
        }
        let hash = self.repo_hash(repo);
        let jitter = (hash % self.jitter_percent as u64) as f64 / 100.0;
        1.0 + jitter
    }

    fn repo_hash(&self, repo: &RepoId) -> u64 {
        let mut hasher = std::hash::DefaultHasher::new();
        repo.hash(&mut hasher);
        hasher.finish()
    }
}
