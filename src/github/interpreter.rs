//! GitHub effect interpreter using octocrab.
//!
//! This module implements `HostInterpreter` and `JobScheduler` for
//! [`OctocrabClient`] against the GitHub REST API.
//!
//! Key implementation details:
//! - Build statuses are commit statuses whose `context` is the build key
//! - Approval revocation dismisses the authenticated user's approving reviews
//! - Jobs are started with a `repository_dispatch` event whose
//!   `client_payload` is the build cause
//! - List endpoints are paginated 100 at a time

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::effects::{BuildState, BuildStatus, HostEffect, HostInterpreter, HostResponse, JobScheduler};
use crate::types::{
    BuildCause, BuildKey, Comment, CommentId, PrId, PrState, PullRequest, RepoId, Repository,
    Revision, Sha,
};

use super::client::OctocrabClient;
use super::error::GitHubApiError;

const PER_PAGE: usize = 100;

/// GitHub rejects status descriptions longer than this.
const MAX_STATUS_DESCRIPTION: usize = 140;

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct UserResponse {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RepoResponse {
    name: String,
    owner: UserResponse,
    #[serde(default)]
    clone_url: Option<String>,
    #[serde(default)]
    ssh_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RefResponse {
    #[serde(rename = "ref")]
    ref_field: String,
    #[serde(default)]
    sha: Option<String>,
    /// Absent when the fork behind a pull request has been deleted.
    #[serde(default)]
    repo: Option<RepoResponse>,
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    user: Option<UserResponse>,
    head: RefResponse,
    base: RefResponse,
}

#[derive(Debug, Deserialize)]
struct CommentResponse {
    id: u64,
    #[serde(default)]
    body: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    context: String,
}

#[derive(Debug, Deserialize)]
struct ReviewResponse {
    id: u64,
    state: String,
    #[serde(default)]
    user: Option<UserResponse>,
}

#[derive(Debug, Deserialize)]
struct BranchResponse {
    name: String,
}

// ─── Interpreter Implementation ───────────────────────────────────────────────

impl HostInterpreter for OctocrabClient {
    type Error = GitHubApiError;

    async fn interpret(&self, effect: HostEffect) -> Result<HostResponse, Self::Error> {
        interpret_host_effect(self, effect).await
    }

    fn is_transient(&self, error: &GitHubApiError) -> bool {
        error.is_transient()
    }
}

impl JobScheduler for OctocrabClient {
    type Error = GitHubApiError;

    async fn start_job(&self, cause: BuildCause) -> Result<(), Self::Error> {
        dispatch_build(self, cause).await
    }
}

/// Interprets a hosting effect, executing it against the GitHub API.
#[instrument(skip_all, fields(effect = effect.name()))]
pub async fn interpret_host_effect(
    client: &OctocrabClient,
    effect: HostEffect,
) -> Result<HostResponse, GitHubApiError> {
    match effect {
        HostEffect::ListOpenPrs => list_open_prs(client).await,
        HostEffect::ListComments { repo, pr } => list_comments(client, &repo, &pr).await,
        HostEffect::PostComment { pr, body } => post_comment(client, &pr, body).await,
        HostEffect::HasBuildStatus { repo, sha, key } => {
            has_build_status(client, &repo, &sha, &key).await
        }
        HostEffect::SetBuildStatus { repo, sha, status } => {
            set_build_status(client, &repo, &sha, status).await
        }
        HostEffect::DeleteApproval { pr } => delete_approval(client, &pr).await,
        HostEffect::PostApproval { pr } => post_approval(client, &pr).await,
        HostEffect::ListBranches { repo } => list_branches(client, &repo).await,
    }
}

/// Fetches every page of a list endpoint.
async fn get_all_pages<T>(client: &OctocrabClient, url: &str) -> Result<Vec<T>, GitHubApiError>
where
    T: serde::de::DeserializeOwned,
{
    let separator = if url.contains('?') { '&' } else { '?' };
    let mut page = 1u32;
    let mut all = Vec::new();
    loop {
        let paged = format!("{}{}per_page={}&page={}", url, separator, PER_PAGE, page);
        let items: Vec<T> = client
            .inner()
            .get(&paged, None::<&()>)
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        let is_last_page = items.len() < PER_PAGE;
        all.extend(items);
        if is_last_page {
            return Ok(all);
        }
        page += 1;
    }
}

fn pr_number(pr: &PrId) -> Result<u64, GitHubApiError> {
    pr.as_str().parse().map_err(|_| {
        GitHubApiError::permanent_without_source(format!(
            "pull request id {:?} is not a number",
            pr.as_str()
        ))
    })
}

// ─── Pull Requests ────────────────────────────────────────────────────────────

async fn list_open_prs(client: &OctocrabClient) -> Result<HostResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/pulls?state=open",
        client.owner(),
        client.repo_name()
    );
    let pulls: Vec<PullResponse> = get_all_pages(client, &url).await?;

    let prs: Vec<_> = pulls
        .into_iter()
        .map(|pull| pull_to_domain(pull, client.repo()))
        .collect();
    debug!(count = prs.len(), "Listed open pull requests");
    Ok(HostResponse::PullRequests(prs))
}

fn repository_from(repo: Option<RepoResponse>, fallback: &RepoId) -> Repository {
    match repo {
        Some(repo) => {
            let mut repository = Repository::new(repo.owner.login, repo.name);
            if let Some(href) = repo.clone_url {
                repository = repository.with_clone_link("https", &href);
            }
            if let Some(href) = repo.ssh_url {
                repository = repository.with_clone_link("ssh", &href);
            }
            repository
        }
        None => Repository::new(&fallback.owner, &fallback.repo),
    }
}

fn revision_from(r: RefResponse, fallback: &RepoId) -> Revision {
    let commit = r.sha.filter(|s| !s.is_empty()).map(Sha::from);
    Revision::new(r.ref_field, commit, repository_from(r.repo, fallback))
}

fn pull_to_domain(pull: PullResponse, repo: &RepoId) -> PullRequest {
    PullRequest {
        id: PrId::from(pull.number),
        title: pull.title.unwrap_or_default(),
        state: PrState::Open,
        author: pull.user.map(|u| u.login).unwrap_or_default(),
        source: revision_from(pull.head, repo),
        destination: revision_from(pull.base, repo),
    }
}

// ─── Comments ─────────────────────────────────────────────────────────────────

impl From<CommentResponse> for Comment {
    fn from(c: CommentResponse) -> Self {
        Comment {
            id: CommentId(c.id),
            content: c.body,
            created_at: c.created_at,
        }
    }
}

async fn list_comments(
    client: &OctocrabClient,
    repo: &RepoId,
    pr: &PrId,
) -> Result<HostResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/issues/{}/comments",
        repo.owner,
        repo.repo,
        pr_number(pr)?
    );
    let comments: Vec<CommentResponse> = get_all_pages(client, &url).await?;
    Ok(HostResponse::Comments(
        comments.into_iter().map(Comment::from).collect(),
    ))
}

async fn post_comment(
    client: &OctocrabClient,
    pr: &PrId,
    body: String,
) -> Result<HostResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/issues/{}/comments",
        client.owner(),
        client.repo_name(),
        pr_number(pr)?
    );

    #[derive(Serialize)]
    struct CommentRequest {
        body: String,
    }

    let posted: CommentResponse = client
        .inner()
        .post(&url, Some(&CommentRequest { body }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(HostResponse::CommentPosted(Comment::from(posted)))
}

// ─── Build Statuses ───────────────────────────────────────────────────────────

/// The commit status `state` GitHub uses for a build state.
pub fn status_state(state: BuildState) -> &'static str {
    match state {
        BuildState::InProgress => "pending",
        BuildState::Successful => "success",
        BuildState::Failed => "failure",
        BuildState::Stopped => "error",
    }
}

fn truncate_description(description: &str) -> String {
    description.chars().take(MAX_STATUS_DESCRIPTION).collect()
}

async fn has_build_status(
    client: &OctocrabClient,
    repo: &RepoId,
    sha: &Sha,
    key: &BuildKey,
) -> Result<HostResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/commits/{}/statuses", repo.owner, repo.repo, sha);
    let statuses: Vec<StatusResponse> = get_all_pages(client, &url).await?;
    let present = statuses.iter().any(|s| s.context == key.as_str());
    Ok(HostResponse::BuildStatusPresent(present))
}

async fn set_build_status(
    client: &OctocrabClient,
    repo: &RepoId,
    sha: &Sha,
    status: BuildStatus,
) -> Result<HostResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/statuses/{}", repo.owner, repo.repo, sha);

    #[derive(Serialize)]
    struct StatusRequest<'a> {
        state: &'static str,
        target_url: &'a str,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        context: &'a str,
    }

    let request = StatusRequest {
        state: status_state(status.state),
        target_url: &status.url,
        description: status.description.as_deref().map(truncate_description),
        context: status.key.as_str(),
    };
    let _: serde_json::Value = client
        .inner()
        .post(&url, Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(HostResponse::BuildStatusSet)
}

// ─── Approvals ────────────────────────────────────────────────────────────────

async fn delete_approval(client: &OctocrabClient, pr: &PrId) -> Result<HostResponse, GitHubApiError> {
    let number = pr_number(pr)?;
    let me: UserResponse = client
        .inner()
        .get("/user", None::<&()>)
        .await
        .map_err(GitHubApiError::from_octocrab)?;

    let url = format!(
        "/repos/{}/{}/pulls/{}/reviews",
        client.owner(),
        client.repo_name(),
        number
    );
    let reviews: Vec<ReviewResponse> = get_all_pages(client, &url).await?;

    #[derive(Serialize)]
    struct DismissRequest {
        message: &'static str,
        event: &'static str,
    }

    for review in own_approvals(&reviews, &me.login) {
        let dismiss_url = format!("{}/{}/dismissals", url, review);
        let _: serde_json::Value = client
            .inner()
            .put(
                &dismiss_url,
                Some(&DismissRequest {
                    message: "New build started",
                    event: "DISMISS",
                }),
            )
            .await
            .map_err(GitHubApiError::from_octocrab)?;
        debug!(review_id = review, "Dismissed approval");
    }
    Ok(HostResponse::ApprovalDeleted)
}

fn own_approvals(reviews: &[ReviewResponse], login: &str) -> Vec<u64> {
    reviews
        .iter()
        .filter(|r| r.state == "APPROVED")
        .filter(|r| r.user.as_ref().is_some_and(|u| u.login == login))
        .map(|r| r.id)
        .collect()
}

async fn post_approval(client: &OctocrabClient, pr: &PrId) -> Result<HostResponse, GitHubApiError> {
    let url = format!(
        "/repos/{}/{}/pulls/{}/reviews",
        client.owner(),
        client.repo_name(),
        pr_number(pr)?
    );

    #[derive(Serialize)]
    struct ReviewRequest {
        event: &'static str,
    }

    let _: serde_json::Value = client
        .inner()
        .post(&url, Some(&ReviewRequest { event: "APPROVE" }))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    Ok(HostResponse::ApprovalPosted)
}

// ─── SCM Discovery ────────────────────────────────────────────────────────────

async fn list_branches(client: &OctocrabClient, repo: &RepoId) -> Result<HostResponse, GitHubApiError> {
    let url = format!("/repos/{}/{}/branches", repo.owner, repo.repo);
    let branches: Vec<BranchResponse> = get_all_pages(client, &url).await?;
    Ok(HostResponse::Branches(
        branches.into_iter().map(|b| b.name).collect(),
    ))
}

// ─── Job Dispatch ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct DispatchRequest<'a> {
    event_type: &'a str,
    client_payload: &'a BuildCause,
}

#[instrument(skip_all, fields(pr = %cause.pull_request_id, sha = %cause.source_commit_hash))]
async fn dispatch_build(client: &OctocrabClient, cause: BuildCause) -> Result<(), GitHubApiError> {
    let url = format!("/repos/{}/{}/dispatches", client.owner(), client.repo_name());
    let request = DispatchRequest {
        event_type: client.dispatch_event(),
        client_payload: &cause,
    };

    // The endpoint answers 204 with an empty body, so skip deserialization.
    let response = client
        .inner()
        ._post(url.as_str(), Some(&request))
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    octocrab::map_github_error(response)
        .await
        .map_err(GitHubApiError::from_octocrab)?;
    debug!(event_type = client.dispatch_event(), "Dispatched build");
    Ok(())
}
