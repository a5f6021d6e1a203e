//! Octocrab client wrapper scoped to a specific repository.
//!
//! Pull-request-level effects carry no repository, so the client holds the
//! repository they apply to. Commit-level effects and branch discovery name
//! their repository explicitly and may reach other repositories.

use octocrab::Octocrab;

use crate::types::{HostingKind, RepoId};

/// Event type used for `repository_dispatch` when none is configured.
pub const DEFAULT_DISPATCH_EVENT: &str = "pr-build";

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository pull requests are listed from.
    repo: RepoId,

    /// `event_type` of the `repository_dispatch` events that start jobs.
    dispatch_event: String,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self {
            client,
            repo,
            dispatch_event: DEFAULT_DISPATCH_EVENT.to_string(),
        }
    }

    /// Creates a client from a token, pointed at github.com or at the
    /// Enterprise Server named by `hosting`.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        hosting: &HostingKind,
    ) -> Result<Self, octocrab::Error> {
        let mut builder = Octocrab::builder().personal_token(token.into());
        if let HostingKind::Server { server_url } = hosting {
            builder = builder.base_uri(server_url.as_str())?;
        }
        Ok(Self::new(builder.build()?, repo))
    }

    /// Sets the `repository_dispatch` event type used by
    /// [`JobScheduler::start_job`](crate::effects::JobScheduler::start_job).
    pub fn with_dispatch_event(mut self, event_type: impl Into<String>) -> Self {
        self.dispatch_event = event_type.into();
        self
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Returns the repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }

    pub fn dispatch_event(&self) -> &str {
        &self.dispatch_event
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .field("dispatch_event", &self.dispatch_event)
            .finish_non_exhaustive()
    }
}
