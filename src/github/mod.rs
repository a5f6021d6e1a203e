//! GitHub API client and effect interpreter.
//!
//! This module executes hosting effects via the octocrab library. It
//! implements the `HostInterpreter` and `JobScheduler` traits defined in the
//! effects module.
//!
//! Key features:
//! - Works against github.com and GitHub Enterprise Server
//! - Distinguishes transient vs permanent errors
//! - Starts jobs through `repository_dispatch`

mod client;
mod error;
mod interpreter;

pub use client::{DEFAULT_DISPATCH_EVENT, OctocrabClient};
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::{interpret_host_effect, status_state};
