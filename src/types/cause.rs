//! Build causes: the immutable record handed to the job scheduler.

use serde::{Deserialize, Serialize};

use super::ids::{PrId, RepoId, Sha};
use super::pr::PullRequest;

/// Which flavour of hosting platform the pull requests come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HostingKind {
    /// The public, multi-tenant service.
    Cloud,

    /// A self-hosted installation reached through its own base URL.
    Server { server_url: String },
}

/// Why and what to build, for one pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildCause {
    pub hosting: HostingKind,
    pub source_branch: String,
    pub target_branch: String,
    pub repository_owner: String,
    pub repository_name: String,
    pub repository_uri: Option<String>,
    pub pull_request_id: PrId,
    pub destination_repository_owner: String,
    pub destination_repository_name: String,
    pub pull_request_title: String,
    pub source_commit_hash: Sha,

    /// `None` when the platform reported no destination commit; kept as null
    /// rather than defaulted.
    pub destination_commit_hash: Option<Sha>,

    pub pull_request_author: String,
}

impl BuildCause {
    /// Builds the cause for `pr`, or `None` if it has no source commit.
    pub fn from_pull_request(pr: &PullRequest, hosting: HostingKind) -> Option<Self> {
        let source_commit_hash = pr.source.commit.clone()?;
        let source_repo = &pr.source.repository;
        let destination_repo = &pr.destination.repository;

        Some(BuildCause {
            hosting,
            source_branch: pr.source.branch.clone(),
            target_branch: pr.destination.branch.clone(),
            repository_owner: source_repo.owner_name.clone(),
            repository_name: source_repo.repository_name.clone(),
            repository_uri: source_repo.preferred_clone_uri().map(str::to_string),
            pull_request_id: pr.id.clone(),
            destination_repository_owner: destination_repo.owner_name.clone(),
            destination_repository_name: destination_repo.repository_name.clone(),
            pull_request_title: pr.title.clone(),
            source_commit_hash,
            destination_commit_hash: pr.destination.commit.clone(),
            pull_request_author: pr.author.clone(),
        })
    }

    /// The repository build statuses for this cause are recorded against.
    pub fn source_repo(&self) -> RepoId {
        RepoId::new(&self.repository_owner, &self.repository_name)
    }

    /// Short human description used in logs and job summaries.
    pub fn short_description(&self) -> String {
        format!(
            "{}: {} => {}",
            self.pull_request_id, self.source_branch, self.target_branch
        )
    }
}

/// The structural view of a pull request that a branch filter inspects.
///
/// Unlike [`BuildCause`] this borrows from the pull request and tolerates a
/// missing source commit, so filtering can run before commit validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BranchCandidate<'a> {
    pub source_branch: &'a str,
    pub target_branch: &'a str,
    pub source_owner: &'a str,
    pub source_repository: &'a str,
    pub destination_owner: &'a str,
    pub destination_repository: &'a str,
    pub source_commit: Option<&'a Sha>,
    pub title: &'a str,
    pub author: &'a str,
}

impl<'a> From<&'a PullRequest> for BranchCandidate<'a> {
    fn from(pr: &'a PullRequest) -> Self {
        BranchCandidate {
            source_branch: &pr.source.branch,
            target_branch: &pr.destination.branch,
            source_owner: &pr.source.repository.owner_name,
            source_repository: &pr.source.repository.repository_name,
            destination_owner: &pr.destination.repository.owner_name,
            destination_repository: &pr.destination.repository.repository_name,
            source_commit: pr.source.commit.as_ref(),
            title: &pr.title,
            author: &pr.author,
        }
    }
}
