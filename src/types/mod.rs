//! Core domain types for the build trigger.
//!
//! This module contains the fundamental types used throughout the application,
//! designed to encode invariants via the type system.

pub mod build_key;
pub mod cause;
pub mod comment;
pub mod ids;
pub mod pr;

// Re-export commonly used types at the module level
pub use build_key::{BuildKey, InvalidBuildKey};
pub use cause::{BranchCandidate, BuildCause, HostingKind};
pub use comment::Comment;
pub use ids::{CommentId, PrId, RepoId, Sha};
pub use pr::{CloneLink, PrState, PullRequest, Repository, Revision};
