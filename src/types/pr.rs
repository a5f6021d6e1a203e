//! Pull request snapshot types.
//!
//! A `PullRequest` is fetched fresh every polling cycle and never mutated; the
//! decision engine derives everything it needs from it.

use serde::{Deserialize, Serialize};

use super::ids::{PrId, RepoId, Sha};

/// The state of a pull request. Only `Open` pull requests are build candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrState {
    Open,
    Merged,
    Declined,
    Superseded,
}

impl PrState {
    /// Returns true if the PR is open.
    pub fn is_open(&self) -> bool {
        matches!(self, PrState::Open)
    }
}

/// A clone link of a repository, keyed by its transport name (`https`, `ssh`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneLink {
    pub name: String,
    pub href: String,
}

impl CloneLink {
    pub fn new(name: impl Into<String>, href: impl Into<String>) -> Self {
        CloneLink {
            name: name.into(),
            href: href.into(),
        }
    }
}

/// The repository a revision lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner_name: String,
    pub repository_name: String,
    #[serde(default)]
    pub clone_links: Vec<CloneLink>,
}

impl Repository {
    pub fn new(owner_name: impl Into<String>, repository_name: impl Into<String>) -> Self {
        Repository {
            owner_name: owner_name.into(),
            repository_name: repository_name.into(),
            clone_links: Vec::new(),
        }
    }

    pub fn with_clone_link(mut self, name: &str, href: &str) -> Self {
        self.clone_links.push(CloneLink::new(name, href));
        self
    }

    pub fn id(&self) -> RepoId {
        RepoId::new(&self.owner_name, &self.repository_name)
    }

    /// Chooses the URI to clone from: the `ssh` link if there is one, otherwise
    /// the first link listed.
    pub fn preferred_clone_uri(&self) -> Option<&str> {
        self.clone_links
            .iter()
            .find(|link| link.name == "ssh")
            .or_else(|| self.clone_links.first())
            .map(|link| link.href.as_str())
    }
}

/// One side (source or destination) of a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub branch: String,

    /// The tip commit. Absent on some pull requests, e.g. when the platform has
    /// not computed a destination commit because of merge conflicts.
    pub commit: Option<Sha>,

    pub repository: Repository,
}

impl Revision {
    pub fn new(branch: impl Into<String>, commit: Option<Sha>, repository: Repository) -> Self {
        Revision {
            branch: branch.into(),
            commit,
            repository,
        }
    }
}

/// A pull request as fetched from the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub id: PrId,
    pub title: String,
    pub state: PrState,
    pub author: String,
    pub source: Revision,
    pub destination: Revision,
}

impl PullRequest {
    /// The repository that owns the pull request (and its comments).
    pub fn destination_repo(&self) -> RepoId {
        self.destination.repository.id()
    }

    /// The repository the source commit lives in; build statuses are recorded here.
    pub fn source_repo(&self) -> RepoId {
        self.source.repository.id()
    }
}
