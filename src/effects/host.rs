//! Hosting-platform effect types.
//!
//! These types describe hosting API operations as data, without executing them.
//! Interpreters (see [`super::interpreter`]) execute them against a real
//! platform or a test double.

use serde::{Deserialize, Serialize};

use crate::types::{BuildKey, Comment, PrId, PullRequest, RepoId, Sha};

/// The state reported for a build on a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildState {
    InProgress,
    Successful,
    Failed,
    Stopped,
}

/// A commit status to record for one build key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildStatus {
    pub key: BuildKey,
    pub state: BuildState,
    /// Link shown next to the status.
    pub url: String,
    pub description: Option<String>,
}

/// A hosting API effect.
///
/// Pull-request-level effects are scoped to the repository the interpreter was
/// built for. Commit-level effects name their repository explicitly, since the
/// source commit of a pull request may live in a fork.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEffect {
    // ─── Pull Requests ────────────────────────────────────────────────────────
    /// List all open pull requests.
    ListOpenPrs,

    // ─── Comments ─────────────────────────────────────────────────────────────
    /// List every comment on a pull request.
    ListComments { repo: RepoId, pr: PrId },

    /// Post a new comment on a pull request.
    PostComment { pr: PrId, body: String },

    // ─── Build Statuses ───────────────────────────────────────────────────────
    /// Ask whether any status has been recorded for `key` on `sha`.
    HasBuildStatus {
        repo: RepoId,
        sha: Sha,
        key: BuildKey,
    },

    /// Record a status for a commit.
    SetBuildStatus {
        repo: RepoId,
        sha: Sha,
        status: BuildStatus,
    },

    // ─── Approvals ────────────────────────────────────────────────────────────
    /// Withdraw this integration's approval of a pull request, if any.
    DeleteApproval { pr: PrId },

    /// Approve a pull request.
    PostApproval { pr: PrId },

    // ─── SCM Discovery ────────────────────────────────────────────────────────
    /// List the branches of a repository.
    ListBranches { repo: RepoId },
}

impl HostEffect {
    /// A short, stable name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            HostEffect::ListOpenPrs => "list_open_prs",
            HostEffect::ListComments { .. } => "list_comments",
            HostEffect::PostComment { .. } => "post_comment",
            HostEffect::HasBuildStatus { .. } => "has_build_status",
            HostEffect::SetBuildStatus { .. } => "set_build_status",
            HostEffect::DeleteApproval { .. } => "delete_approval",
            HostEffect::PostApproval { .. } => "post_approval",
            HostEffect::ListBranches { .. } => "list_branches",
        }
    }
}

/// Response from a hosting effect.
///
/// Each variant corresponds to the response from a particular effect type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum HostResponse {
    /// Response to `ListOpenPrs`.
    PullRequests(Vec<PullRequest>),

    /// Response to `ListComments`.
    Comments(Vec<Comment>),

    /// Response to `PostComment`.
    CommentPosted(Comment),

    /// Response to `HasBuildStatus`.
    BuildStatusPresent(bool),

    /// Response to `SetBuildStatus`.
    BuildStatusSet,

    /// Response to `DeleteApproval`.
    ApprovalDeleted,

    /// Response to `PostApproval`.
    ApprovalPosted,

    /// Response to `ListBranches`.
    Branches(Vec<String>),
}
