//! The trigger orchestrator.
//!
//! Runs the decision for every open pull request, one at a time, and performs
//! the side effects for the ones that should build: ledger comment, approval
//! revocation, in-progress status, job submission.
//!
//! A failure while handling one pull request is logged and recorded in the
//! cycle report; the remaining pull requests are still processed.

use std::fmt;

use tracing::{debug, error, info, instrument, warn};

use crate::effects::{BuildState, BuildStatus, HostInterpreter, JobScheduler};
use crate::filter::{BranchFilter, FilterMode, ScmSource};
use crate::types::{BuildCause, BuildKey, HostingKind, PullRequest};

use super::calls;
use super::decide::{TriggerRules, decide};
use super::error::{CycleError, DecisionError, OrchestratorError};
use super::report::{CycleReport, PrOutcome};

/// Static configuration for an [`Orchestrator`].
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub hosting: HostingKind,

    /// Link attached to in-progress statuses.
    pub root_url: String,

    /// Display name of the job, used in final status descriptions.
    pub job_display_name: String,

    /// Revoke approval when a build starts and approve when it succeeds.
    pub approve_if_success: bool,

    pub rules: TriggerRules,
    pub filter: FilterMode,
}

/// Drives one build key through polling cycles.
pub struct Orchestrator<H, J> {
    host: H,
    scheduler: J,
    config: OrchestratorConfig,
}

impl<H, J> Orchestrator<H, J>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
    J: JobScheduler,
    J::Error: fmt::Display,
{
    pub fn new(host: H, scheduler: J, config: OrchestratorConfig) -> Self {
        Orchestrator {
            host,
            scheduler,
            config,
        }
    }

    /// Runs one full cycle: list open pull requests, resolve the branch filter
    /// and process each pull request.
    #[instrument(skip_all, fields(build_key = %key))]
    pub async fn run_cycle(&self, key: &BuildKey) -> Result<CycleReport, CycleError> {
        debug!("Fetching pull requests");
        let prs = calls::list_open_prs(&self.host)
            .await
            .map_err(CycleError::ListPullRequests)?;
        let filter = self.resolve_filter().await?;

        let report = self.run(&prs, &filter, key).await;
        info!(
            fetched = report.fetched(),
            triggered = report.triggered(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Cycle complete"
        );
        Ok(report)
    }

    /// Turns the configured filter mode into a usable filter, discovering SCM
    /// branches if needed.
    pub async fn resolve_filter(&self) -> Result<BranchFilter, CycleError> {
        match &self.config.filter {
            FilterMode::Pattern(pattern) => Ok(BranchFilter::Pattern(pattern.clone())),
            FilterMode::ScmIncludes(repos) => {
                let mut sources = Vec::with_capacity(repos.len());
                for repo in repos {
                    let branches = calls::list_branches(&self.host, repo.clone())
                        .await
                        .map_err(|source| CycleError::ScmDiscovery {
                            repo: repo.to_string(),
                            source,
                        })?;
                    debug!(repo = %repo, count = branches.len(), "Discovered SCM branches");
                    sources.push(ScmSource::new(repo.clone(), branches));
                }
                Ok(BranchFilter::Scm(sources))
            }
        }
    }

    /// Processes `prs` in order and reports what happened to each.
    pub async fn run(
        &self,
        prs: &[PullRequest],
        filter: &BranchFilter,
        key: &BuildKey,
    ) -> CycleReport {
        let mut report = CycleReport::begin(key.clone());
        for pr in prs {
            let outcome = match self.process(pr, filter, key).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let transient = e.is_transient();
                    if transient {
                        warn!(pr = %pr.id, error = %e, "Failed to process pull request; retrying next cycle");
                    } else {
                        error!(pr = %pr.id, error = %e, "Failed to process pull request");
                    }
                    PrOutcome::Failed {
                        error: e.to_string(),
                        transient,
                    }
                }
            };
            report.record(pr.id.clone(), outcome);
        }
        report.finish()
    }

    #[instrument(skip_all, fields(pr = %pr.id))]
    async fn process(
        &self,
        pr: &PullRequest,
        filter: &BranchFilter,
        key: &BuildKey,
    ) -> Result<PrOutcome, OrchestratorError> {
        let decision = decide(&self.host, &self.config.rules, filter, pr, key).await?;
        if !decision.trigger {
            info!(reason = %decision.reason, "Not building");
            return Ok(PrOutcome::Skipped {
                reason: decision.reason,
            });
        }

        if let Some(post) = decision.ledger_post {
            let comment = calls::post_comment(&self.host, post.pr, post.body).await?;
            debug!(comment_id = %comment.id, "Posted ledger comment");
        }

        self.start_build(pr, key).await?;
        info!(reason = %decision.reason, "Build triggered");
        Ok(PrOutcome::Triggered {
            reason: decision.reason,
        })
    }

    async fn start_build(&self, pr: &PullRequest, key: &BuildKey) -> Result<(), OrchestratorError> {
        if self.config.approve_if_success
            && let Err(e) = calls::delete_approval(&self.host, pr.id.clone()).await
        {
            warn!(error = %e, "Failed to delete approval; continuing");
        }

        if pr.destination.commit.is_none() {
            info!(
                title = %pr.title,
                repo = %pr.destination.repository.repository_name,
                "Pull request has no destination commit"
            );
        }
        let cause = BuildCause::from_pull_request(pr, self.config.hosting.clone())
            .ok_or_else(|| DecisionError::MissingSourceCommit { pr: pr.id.clone() })?;
        debug!(uri = ?cause.repository_uri, cause = %cause.short_description(), "Using repository URI");

        self.set_build_status(&cause, key, BuildState::InProgress, &self.config.root_url)
            .await?;

        self.scheduler
            .start_job(cause)
            .await
            .map_err(|e| OrchestratorError::Scheduler(e.to_string()))
    }

    /// Records `state` for the cause's source commit.
    ///
    /// Final states carry a `"<job>: <commit> into <target>"` description.
    pub async fn set_build_status(
        &self,
        cause: &BuildCause,
        key: &BuildKey,
        state: BuildState,
        build_url: &str,
    ) -> Result<(), OrchestratorError> {
        debug!(
            state = ?state,
            sha = %cause.source_commit_hash,
            url = build_url,
            "Setting build status"
        );
        let description = matches!(state, BuildState::Successful | BuildState::Failed).then(|| {
            format!(
                "{}: {} into {}",
                self.config.job_display_name, cause.source_commit_hash, cause.target_branch
            )
        });
        let status = BuildStatus {
            key: key.clone(),
            state,
            url: build_url.to_string(),
            description,
        };
        calls::set_build_status(
            &self.host,
            cause.source_repo(),
            cause.source_commit_hash.clone(),
            status,
        )
        .await?;
        Ok(())
    }

    /// Reports the end of a build started for `cause`.
    ///
    /// Approves the pull request on success when `approve_if_success` is set.
    #[instrument(skip(self, cause), fields(pr = %cause.pull_request_id))]
    pub async fn report_result(
        &self,
        cause: &BuildCause,
        key: &BuildKey,
        state: BuildState,
        build_url: &str,
    ) -> Result<(), OrchestratorError> {
        self.set_build_status(cause, key, state, build_url).await?;
        if self.config.approve_if_success && state == BuildState::Successful {
            calls::post_approval(&self.host, cause.pull_request_id.clone()).await?;
            debug!("Approved pull request");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::{LEDGER_COMMENT_PREAMBLE, render_ledger_append};
    use crate::effects::HostEffect;
    use crate::engine::DecisionReason;
    use crate::filter::{BranchPattern, SkipPhrases};
    use crate::test_utils::{MockHost, MockScheduler, PullRequestBuilder, at};
    use crate::types::{Comment, RepoId};

    fn key() -> BuildKey {
        BuildKey::new("jenkins-app").unwrap()
    }

    fn config() -> OrchestratorConfig {
        OrchestratorConfig {
            hosting: HostingKind::Cloud,
            root_url: "https://ci.example.com/".to_string(),
            job_display_name: "app".to_string(),
            approve_if_success: false,
            rules: TriggerRules::default(),
            filter: FilterMode::Pattern(BranchPattern::any()),
        }
    }

    fn orchestrator(host: MockHost, config: OrchestratorConfig) -> Orchestrator<MockHost, MockScheduler> {
        Orchestrator::new(host, MockScheduler::new(), config)
    }

    #[tokio::test]
    async fn new_commit_sets_status_and_starts_job() {
        let host = MockHost::new();
        let pr = PullRequestBuilder::new("1").build();
        host.set_open(vec![pr.clone()]);
        let orch = orchestrator(host, config());

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.triggered(), 1);
        let jobs = orch.scheduler.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].pull_request_id, pr.id);

        let statuses: Vec<_> = orch
            .host
            .effects()
            .into_iter()
            .filter_map(|e| match e {
                HostEffect::SetBuildStatus { status, .. } => Some(status),
                _ => None,
            })
            .collect();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].state, BuildState::InProgress);
        assert_eq!(statuses[0].url, "https://ci.example.com/");
        assert_eq!(statuses[0].description, None);
    }

    #[tokio::test]
    async fn second_cycle_does_not_retrigger() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        let orch = orchestrator(host, config());

        let first = orch.run_cycle(&key()).await.unwrap();
        let second = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(first.triggered(), 1);
        assert_eq!(second.triggered(), 0);
        assert_eq!(
            second.pull_requests[0].outcome,
            PrOutcome::Skipped {
                reason: DecisionReason::AlreadyProcessed
            }
        );
        assert_eq!(orch.scheduler.jobs().len(), 1);
    }

    #[tokio::test]
    async fn rebuild_posts_ledger_once() {
        let host = MockHost::new();
        let pr = PullRequestBuilder::new("1").build();
        host.set_open(vec![pr.clone()]);
        host.record_status(&pr, &key());
        host.add_comment("1", Comment::new(1, "test this please", at(1)));
        let orch = orchestrator(host, config());

        let first = orch.run_cycle(&key()).await.unwrap();
        let second = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(first.triggered(), 1);
        assert_eq!(second.triggered(), 0);

        let posts: Vec<_> = orch
            .host
            .effects()
            .into_iter()
            .filter_map(|e| match e {
                HostEffect::PostComment { body, .. } => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(
            posts,
            vec![render_ledger_append(LEDGER_COMMENT_PREAMBLE, "#jenkins-app")]
        );
    }

    #[tokio::test]
    async fn failure_on_one_pr_does_not_stop_others() {
        let host = MockHost::new();
        host.set_open(vec![
            PullRequestBuilder::new("1").source_commit(None).build(),
            PullRequestBuilder::new("2").build(),
        ]);
        let orch = orchestrator(host, config());

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.triggered(), 1);
        assert!(matches!(
            report.pull_requests[0].outcome,
            PrOutcome::Failed { ref error, transient: false } if error.contains("no source commit")
        ));
        assert_eq!(orch.scheduler.jobs()[0].pull_request_id.as_str(), "2");
    }

    #[tokio::test]
    async fn scheduler_failure_is_recorded() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        let orch = Orchestrator::new(host, MockScheduler::failing(), config());

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.pull_requests[0].outcome,
            PrOutcome::Failed { transient: false, .. }
        ));
    }

    #[tokio::test]
    async fn list_failure_aborts_cycle() {
        let host = MockHost::new();
        host.fail_on("list_open_prs");
        let orch = orchestrator(host, config());

        let result = orch.run_cycle(&key()).await;

        assert!(matches!(result, Err(CycleError::ListPullRequests(_))));
    }

    #[tokio::test]
    async fn transient_host_failure_is_marked_in_report() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        host.fail_transiently_on("list_comments");
        let orch = orchestrator(host, config());

        let report = orch.run_cycle(&key()).await.unwrap();

        assert!(matches!(
            report.pull_requests[0].outcome,
            PrOutcome::Failed { transient: true, .. }
        ));
    }

    #[tokio::test]
    async fn permanent_failures_are_not_transient() {
        let host = MockHost::new();
        host.set_open(vec![
            PullRequestBuilder::new("1").build(),
            PullRequestBuilder::new("2").build(),
        ]);
        host.fail_on("list_comments");
        let orch = orchestrator(host, config());

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.failed(), 2);
        assert!(report.pull_requests.iter().all(|r| matches!(
            r.outcome,
            PrOutcome::Failed { transient: false, .. }
        )));
    }

    #[tokio::test]
    async fn approval_revoked_before_status_when_enabled() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        let orch = orchestrator(
            host,
            OrchestratorConfig {
                approve_if_success: true,
                ..config()
            },
        );

        orch.run_cycle(&key()).await.unwrap();

        let effects = orch.host.effects();
        let revoke = effects
            .iter()
            .position(|e| matches!(e, HostEffect::DeleteApproval { pr } if pr.as_str() == "1"))
            .expect("approval revoked");
        let status = effects
            .iter()
            .position(|e| matches!(e, HostEffect::SetBuildStatus { .. }))
            .expect("status set");
        assert!(revoke < status);
    }

    #[tokio::test]
    async fn approval_untouched_when_disabled() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        let orch = orchestrator(host, config());

        orch.run_cycle(&key()).await.unwrap();

        assert!(
            !orch
                .host
                .effects()
                .iter()
                .any(|e| matches!(e, HostEffect::DeleteApproval { .. }))
        );
    }

    #[tokio::test]
    async fn approval_revocation_is_best_effort() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").build()]);
        host.fail_on("delete_approval");
        let orch = orchestrator(
            host,
            OrchestratorConfig {
                approve_if_success: true,
                ..config()
            },
        );

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.triggered(), 1);
        assert_eq!(orch.scheduler.jobs().len(), 1);
    }

    #[tokio::test]
    async fn missing_destination_commit_still_builds() {
        let host = MockHost::new();
        host.set_open(vec![
            PullRequestBuilder::new("1").destination_commit(None).build(),
        ]);
        let orch = orchestrator(host, config());

        orch.run_cycle(&key()).await.unwrap();

        let jobs = orch.scheduler.jobs();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].destination_commit_hash, None);
    }

    #[tokio::test]
    async fn skip_phrase_reported() {
        let host = MockHost::new();
        host.set_open(vec![PullRequestBuilder::new("1").title("WIP: fix bug").build()]);
        let mut cfg = config();
        cfg.rules.skip_phrases = SkipPhrases::parse("wip");
        let orch = orchestrator(host, cfg);

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.skipped(), 1);
        assert!(orch.scheduler.jobs().is_empty());
    }

    #[tokio::test]
    async fn scm_filter_discovers_branches() {
        let host = MockHost::new();
        host.set_branches(RepoId::new("o", "r"), &["release/1.0"]);
        host.set_open(vec![
            PullRequestBuilder::new("1").target_branch("release/1.0").build(),
            PullRequestBuilder::new("2").target_branch("main").build(),
        ]);
        let orch = orchestrator(
            host,
            OrchestratorConfig {
                filter: FilterMode::ScmIncludes(vec![RepoId::new("o", "r")]),
                ..config()
            },
        );

        let report = orch.run_cycle(&key()).await.unwrap();

        assert_eq!(report.triggered(), 1);
        assert_eq!(
            report.pull_requests[1].outcome,
            PrOutcome::Skipped {
                reason: DecisionReason::FilterRejected
            }
        );
    }

    #[tokio::test]
    async fn report_result_describes_and_approves() {
        let host = MockHost::new();
        let pr = PullRequestBuilder::new("1").target_branch("main").build();
        let orch = orchestrator(
            host,
            OrchestratorConfig {
                approve_if_success: true,
                ..config()
            },
        );
        let cause = BuildCause::from_pull_request(&pr, HostingKind::Cloud).unwrap();

        orch.report_result(&cause, &key(), BuildState::Successful, "https://ci/1")
            .await
            .unwrap();

        let effects = orch.host.effects();
        match &effects[0] {
            HostEffect::SetBuildStatus { status, .. } => {
                assert_eq!(status.state, BuildState::Successful);
                assert_eq!(
                    status.description.as_deref(),
                    Some(format!("app: {} into main", cause.source_commit_hash).as_str())
                );
            }
            other => panic!("expected status update, got {:?}", other),
        }
        assert!(matches!(&effects[1], HostEffect::PostApproval { pr } if pr.as_str() == "1"));
    }

    #[tokio::test]
    async fn failed_result_does_not_approve() {
        let host = MockHost::new();
        let pr = PullRequestBuilder::new("1").build();
        let orch = orchestrator(
            host,
            OrchestratorConfig {
                approve_if_success: true,
                ..config()
            },
        );
        let cause = BuildCause::from_pull_request(&pr, HostingKind::Cloud).unwrap();

        orch.report_result(&cause, &key(), BuildState::Failed, "https://ci/1")
            .await
            .unwrap();

        assert_eq!(orch.host.effects().len(), 1);
    }
}
