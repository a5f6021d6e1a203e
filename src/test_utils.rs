//! Shared test utilities: in-memory hosting and scheduler doubles, a pull
//! request builder, and arbitrary generators for property-based testing.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use proptest::prelude::*;

use crate::effects::{HostEffect, HostInterpreter, HostResponse, JobScheduler};
use crate::types::{
    BuildCause, BuildKey, Comment, CommentId, PrId, PrState, PullRequest, RepoId, Repository,
    Revision, Sha,
};

/// A fixed timestamp `secs` seconds after the epoch.
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

// ─── Hosting double ───────────────────────────────────────────────────────────

#[derive(Default)]
struct MockHostState {
    open: Vec<PullRequest>,
    comments: HashMap<String, Vec<Comment>>,
    statuses: HashSet<(RepoId, Sha, BuildKey)>,
    branches: HashMap<RepoId, Vec<String>>,
    // effect name -> transient
    failing: HashMap<String, bool>,
    effects: Vec<HostEffect>,
    next_comment_id: u64,
}

/// An in-memory hosting platform.
///
/// Records every effect it interprets. Posted comments and recorded statuses
/// are visible to later effects, so several cycles can run against one host.
#[derive(Default)]
pub struct MockHost {
    state: Mutex<MockHostState>,
}

impl MockHost {
    pub fn new() -> Self {
        let host = MockHost::default();
        host.state.lock().unwrap().next_comment_id = 10_000;
        host
    }

    pub fn set_open(&self, prs: Vec<PullRequest>) {
        self.state.lock().unwrap().open = prs;
    }

    pub fn add_comment(&self, pr: &str, comment: Comment) {
        self.state
            .lock()
            .unwrap()
            .comments
            .entry(pr.to_string())
            .or_default()
            .push(comment);
    }

    /// Marks the source commit of `pr` as already built for `key`.
    pub fn record_status(&self, pr: &PullRequest, key: &BuildKey) {
        let sha = pr.source.commit.clone().expect("pull request has a source commit");
        self.state
            .lock()
            .unwrap()
            .statuses
            .insert((pr.source_repo(), sha, key.clone()));
    }

    pub fn set_branches(&self, repo: RepoId, branches: &[&str]) {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(repo, branches.iter().map(|b| b.to_string()).collect());
    }

    /// Makes every effect named `effect` fail.
    pub fn fail_on(&self, effect: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(effect.to_string(), false);
    }

    /// Like [`MockHost::fail_on`], but the failure is reported as transient.
    pub fn fail_transiently_on(&self, effect: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(effect.to_string(), true);
    }

    pub fn effects(&self) -> Vec<HostEffect> {
        self.state.lock().unwrap().effects.clone()
    }

    fn apply(&self, effect: HostEffect) -> Result<HostResponse, String> {
        let mut state = self.state.lock().unwrap();
        state.effects.push(effect.clone());
        match state.failing.get(effect.name()) {
            Some(true) => return Err(format!("{} temporarily unavailable", effect.name())),
            Some(false) => return Err(format!("{} unavailable", effect.name())),
            None => {}
        }

        let response = match effect {
            HostEffect::ListOpenPrs => HostResponse::PullRequests(state.open.clone()),
            HostEffect::ListComments { pr, .. } => HostResponse::Comments(
                state.comments.get(pr.as_str()).cloned().unwrap_or_default(),
            ),
            HostEffect::PostComment { pr, body } => {
                let id = state.next_comment_id;
                state.next_comment_id += 1;
                let comment = Comment::new(id, body, Utc::now());
                state
                    .comments
                    .entry(pr.as_str().to_string())
                    .or_default()
                    .push(comment.clone());
                HostResponse::CommentPosted(comment)
            }
            HostEffect::HasBuildStatus { repo, sha, key } => {
                HostResponse::BuildStatusPresent(state.statuses.contains(&(repo, sha, key)))
            }
            HostEffect::SetBuildStatus { repo, sha, status } => {
                state.statuses.insert((repo, sha, status.key));
                HostResponse::BuildStatusSet
            }
            HostEffect::DeleteApproval { .. } => HostResponse::ApprovalDeleted,
            HostEffect::PostApproval { .. } => HostResponse::ApprovalPosted,
            HostEffect::ListBranches { repo } => {
                HostResponse::Branches(state.branches.get(&repo).cloned().unwrap_or_default())
            }
        };
        Ok(response)
    }
}

impl HostInterpreter for MockHost {
    type Error = String;

    async fn interpret(&self, effect: HostEffect) -> Result<HostResponse, Self::Error> {
        self.apply(effect)
    }

    fn is_transient(&self, error: &String) -> bool {
        error.contains("temporarily")
    }
}

// ─── Scheduler double ─────────────────────────────────────────────────────────

/// Collects submitted build causes, or rejects them all.
#[derive(Default)]
pub struct MockScheduler {
    jobs: Mutex<Vec<BuildCause>>,
    failing: bool,
}

impl MockScheduler {
    pub fn new() -> Self {
        MockScheduler::default()
    }

    pub fn failing() -> Self {
        MockScheduler {
            failing: true,
            ..MockScheduler::default()
        }
    }

    pub fn jobs(&self) -> Vec<BuildCause> {
        self.jobs.lock().unwrap().clone()
    }
}

impl JobScheduler for MockScheduler {
    type Error = String;

    async fn start_job(&self, cause: BuildCause) -> Result<(), Self::Error> {
        if self.failing {
            return Err("queue is closed".to_string());
        }
        self.jobs.lock().unwrap().push(cause);
        Ok(())
    }
}

// ─── Pull request builder ─────────────────────────────────────────────────────

/// Builds an open pull request from `feature` in `owner/repo` into `main` of
/// the same repository, with both commits present.
pub struct PullRequestBuilder {
    id: PrId,
    title: String,
    state: PrState,
    author: String,
    source: Revision,
    destination: Revision,
}

impl PullRequestBuilder {
    pub fn new(id: &str) -> Self {
        PullRequestBuilder {
            id: PrId::new(id),
            title: format!("Pull request {}", id),
            state: PrState::Open,
            author: "alice".to_string(),
            source: Revision::new(
                "feature",
                Some(Sha::new(format!("{:a>40}", id))),
                Repository::new("owner", "repo"),
            ),
            destination: Revision::new(
                "main",
                Some(Sha::new(format!("{:b>40}", id))),
                Repository::new("owner", "repo"),
            ),
        }
    }

    pub fn state(mut self, state: PrState) -> Self {
        self.state = state;
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn source_branch(mut self, branch: &str) -> Self {
        self.source.branch = branch.to_string();
        self
    }

    pub fn target_branch(mut self, branch: &str) -> Self {
        self.destination.branch = branch.to_string();
        self
    }

    pub fn source_commit(mut self, sha: Option<&str>) -> Self {
        self.source.commit = sha.map(Sha::from);
        self
    }

    pub fn destination_commit(mut self, sha: Option<&str>) -> Self {
        self.destination.commit = sha.map(Sha::from);
        self
    }

    pub fn source_repo(mut self, owner: &str, name: &str) -> Self {
        self.source.repository = Repository::new(owner, name);
        self
    }

    pub fn destination_repo(mut self, owner: &str, name: &str) -> Self {
        self.destination.repository = Repository::new(owner, name);
        self
    }

    pub fn source_clone_links(mut self, links: &[(&str, &str)]) -> Self {
        for (name, href) in links {
            self.source.repository = self.source.repository.with_clone_link(name, href);
        }
        self
    }

    pub fn build(self) -> PullRequest {
        PullRequest {
            id: self.id,
            title: self.title,
            state: self.state,
            author: self.author,
            source: self.source,
            destination: self.destination,
        }
    }
}

// ─── Generators ───────────────────────────────────────────────────────────────

pub fn arb_comment_body() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("test this please".to_string())),
        Just(Some("Please TEST THIS PLEASE now".to_string())),
        Just(Some("TTP build flag ```[bid: #jenkins-app]```".to_string())),
        Just(Some("TTP build flag ```[bid: #jenkins-app #jenkins-lint]```".to_string())),
        "[a-z ]{1,30}".prop_map(Some),
    ]
}

/// Comment histories with unique ids and possibly colliding timestamps.
pub fn arb_comments() -> impl Strategy<Value = Vec<Comment>> {
    prop::collection::vec((arb_comment_body(), 0i64..50), 0..20).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (content, secs))| Comment {
                id: CommentId(i as u64 + 1),
                content,
                created_at: at(secs),
            })
            .collect()
    })
}
