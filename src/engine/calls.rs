//! Typed wrappers around [`HostInterpreter::interpret`].
//!
//! Each wrapper issues one effect and unpacks the matching response variant,
//! turning interpreter failures into [`HostCallError`].

use std::fmt;

use crate::effects::{BuildStatus, HostEffect, HostInterpreter, HostResponse};
use crate::types::{BuildKey, Comment, PrId, PullRequest, RepoId, Sha};

use super::error::HostCallError;

async fn call<H>(host: &H, effect: HostEffect) -> Result<(&'static str, HostResponse), HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    let name = effect.name();
    let response = host
        .interpret(effect)
        .await
        .map_err(|e| HostCallError::Api {
            effect: name,
            message: e.to_string(),
            transient: host.is_transient(&e),
        })?;
    Ok((name, response))
}

fn unexpected(effect: &'static str, response: HostResponse) -> HostCallError {
    HostCallError::UnexpectedResponse {
        effect,
        response: Box::new(response),
    }
}

pub async fn list_open_prs<H>(host: &H) -> Result<Vec<PullRequest>, HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::ListOpenPrs).await? {
        (_, HostResponse::PullRequests(prs)) => Ok(prs),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn list_comments<H>(
    host: &H,
    repo: RepoId,
    pr: PrId,
) -> Result<Vec<Comment>, HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::ListComments { repo, pr }).await? {
        (_, HostResponse::Comments(comments)) => Ok(comments),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn post_comment<H>(host: &H, pr: PrId, body: String) -> Result<Comment, HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::PostComment { pr, body }).await? {
        (_, HostResponse::CommentPosted(comment)) => Ok(comment),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn has_build_status<H>(
    host: &H,
    repo: RepoId,
    sha: Sha,
    key: BuildKey,
) -> Result<bool, HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::HasBuildStatus { repo, sha, key }).await? {
        (_, HostResponse::BuildStatusPresent(present)) => Ok(present),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn set_build_status<H>(
    host: &H,
    repo: RepoId,
    sha: Sha,
    status: BuildStatus,
) -> Result<(), HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::SetBuildStatus { repo, sha, status }).await? {
        (_, HostResponse::BuildStatusSet) => Ok(()),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn delete_approval<H>(host: &H, pr: PrId) -> Result<(), HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::DeleteApproval { pr }).await? {
        (_, HostResponse::ApprovalDeleted) => Ok(()),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn post_approval<H>(host: &H, pr: PrId) -> Result<(), HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::PostApproval { pr }).await? {
        (_, HostResponse::ApprovalPosted) => Ok(()),
        (name, other) => Err(unexpected(name, other)),
    }
}

pub async fn list_branches<H>(host: &H, repo: RepoId) -> Result<Vec<String>, HostCallError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    match call(host, HostEffect::ListBranches { repo }).await? {
        (_, HostResponse::Branches(branches)) => Ok(branches),
        (name, other) => Err(unexpected(name, other)),
    }
}
