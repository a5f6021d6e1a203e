//! Interval-driven polling.
//!
//! One [`Poller`] drives one build key against one repository. Cycles run
//! serially; shutdown is observed between cycles through a
//! `CancellationToken`.
//!
//! # Module Structure
//!
//! - [`poll`]: Poll interval and jitter
//! - [`poller`]: The loop itself

mod poll;
mod poller;

pub use poll::PollConfig;
pub use poller::Poller;
