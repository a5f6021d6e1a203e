//! Effects-as-data for hosting-platform operations.
//!
//! This module defines effect types that describe operations without executing them.
//! This enables:
//! - Pure core logic that only depends on the abstract collaborator interface
//! - Testability via mock interpreters
//! - Logging/tracing of intended operations

pub mod host;
pub mod interpreter;

pub use host::{BuildState, BuildStatus, HostEffect, HostResponse};
pub use interpreter::{HostInterpreter, JobScheduler};
