//! Environment-driven configuration.
//!
//! Every setting comes from a `PR_BUILD_TRIGGER_*` variable (plus
//! `GITHUB_TOKEN`). Parsing goes through a lookup function so tests can feed a
//! map instead of the process environment. Blank values count as unset.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::engine::{OrchestratorConfig, TriggerRules};
use crate::filter::{BranchPattern, FilterMode, InvalidPattern, SkipPhrases};
use crate::types::{BuildKey, HostingKind, InvalidBuildKey, RepoId};
use crate::worker::PollConfig;

pub const TOKEN_VAR: &str = "GITHUB_TOKEN";
pub const REPO_VAR: &str = "PR_BUILD_TRIGGER_REPO";
pub const SERVER_URL_VAR: &str = "PR_BUILD_TRIGGER_SERVER_URL";
pub const CI_KEY_VAR: &str = "PR_BUILD_TRIGGER_CI_KEY";
pub const JOB_VAR: &str = "PR_BUILD_TRIGGER_JOB";
pub const COMMENT_TRIGGER_VAR: &str = "PR_BUILD_TRIGGER_COMMENT_TRIGGER";
pub const SKIP_PHRASES_VAR: &str = "PR_BUILD_TRIGGER_SKIP_PHRASES";
pub const BRANCHES_FILTER_VAR: &str = "PR_BUILD_TRIGGER_BRANCHES_FILTER";
pub const FILTER_BY_SCM_VAR: &str = "PR_BUILD_TRIGGER_FILTER_BY_SCM";
pub const SCM_SOURCES_VAR: &str = "PR_BUILD_TRIGGER_SCM_SOURCES";
pub const APPROVE_IF_SUCCESS_VAR: &str = "PR_BUILD_TRIGGER_APPROVE_IF_SUCCESS";
pub const ROOT_URL_VAR: &str = "PR_BUILD_TRIGGER_ROOT_URL";
pub const POLL_INTERVAL_VAR: &str = "PR_BUILD_TRIGGER_POLL_INTERVAL_SECS";
pub const LISTEN_VAR: &str = "PR_BUILD_TRIGGER_LISTEN";

const DEFAULT_CI_KEY: &str = "jenkins";
const DEFAULT_ROOT_URL: &str = "http://localhost:3000/";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 300;
const DEFAULT_LISTEN: &str = "0.0.0.0:3000";

/// Errors from reading the configuration. All of them are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error(transparent)]
    BuildKey(#[from] InvalidBuildKey),

    #[error(transparent)]
    BranchPattern(#[from] InvalidPattern),

    #[error("PR_BUILD_TRIGGER_FILTER_BY_SCM is set but PR_BUILD_TRIGGER_SCM_SOURCES names no repositories")]
    NoScmSources,
}

/// The complete runtime configuration.
#[derive(Clone)]
pub struct TriggerConfig {
    pub token: String,
    pub repo: RepoId,
    pub hosting: HostingKind,
    pub build_key: BuildKey,

    /// Job name, shown in final status descriptions.
    pub job: String,

    pub rules: TriggerRules,
    pub filter: FilterMode,
    pub approve_if_success: bool,
    pub root_url: String,
    pub poll: PollConfig,
    pub listen: SocketAddr,
}

impl fmt::Debug for TriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerConfig")
            .field("repo", &self.repo)
            .field("hosting", &self.hosting)
            .field("build_key", &self.build_key)
            .field("filter", &self.filter)
            .field("approve_if_success", &self.approve_if_success)
            .field("root_url", &self.root_url)
            .field("poll", &self.poll)
            .field("listen", &self.listen)
            .finish_non_exhaustive()
    }
}

impl TriggerConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing { var });

        let token = require(TOKEN_VAR)?;

        let repo_raw = require(REPO_VAR)?;
        let repo = RepoId::parse(&repo_raw).ok_or_else(|| ConfigError::Invalid {
            var: REPO_VAR,
            value: repo_raw.clone(),
            reason: "expected owner/repo".to_string(),
        })?;

        let hosting = match get(SERVER_URL_VAR) {
            Some(server_url) => HostingKind::Server { server_url },
            None => HostingKind::Cloud,
        };

        let job = require(JOB_VAR)?;
        let ci_key = get(CI_KEY_VAR).unwrap_or_else(|| DEFAULT_CI_KEY.to_string());
        let build_key = BuildKey::scoped(&ci_key, &job)?;

        let rules = TriggerRules {
            // Matched as a raw substring, so surrounding spaces are kept.
            comment_trigger: lookup(COMMENT_TRIGGER_VAR).filter(|v| !v.trim().is_empty()),
            skip_phrases: SkipPhrases::parse(&get(SKIP_PHRASES_VAR).unwrap_or_default()),
        };

        let pattern = BranchPattern::parse(&get(BRANCHES_FILTER_VAR).unwrap_or_default())?;
        let by_scm = parse_bool(FILTER_BY_SCM_VAR, get(FILTER_BY_SCM_VAR))?;
        let sources = parse_repo_list(SCM_SOURCES_VAR, get(SCM_SOURCES_VAR))?;
        if by_scm && sources.is_empty() {
            return Err(ConfigError::NoScmSources);
        }
        let filter = FilterMode::select(by_scm, pattern, sources);

        let approve_if_success = parse_bool(APPROVE_IF_SUCCESS_VAR, get(APPROVE_IF_SUCCESS_VAR))?;
        let root_url = get(ROOT_URL_VAR).unwrap_or_else(|| DEFAULT_ROOT_URL.to_string());

        let poll_secs = match get(POLL_INTERVAL_VAR) {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: POLL_INTERVAL_VAR,
                        value: raw,
                        reason: "expected a positive number of seconds".to_string(),
                    });
                }
            },
            None => DEFAULT_POLL_INTERVAL_SECS,
        };

        let listen_raw = get(LISTEN_VAR).unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: LISTEN_VAR,
                value: listen_raw.clone(),
                reason: e.to_string(),
            })?;

        Ok(TriggerConfig {
            token,
            repo,
            hosting,
            build_key,
            job,
            rules,
            filter,
            approve_if_success,
            root_url,
            poll: PollConfig::with_interval(Duration::from_secs(poll_secs)),
            listen,
        })
    }

    /// The orchestrator's share of the configuration.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            hosting: self.hosting.clone(),
            root_url: self.root_url.clone(),
            job_display_name: self.job.clone(),
            approve_if_success: self.approve_if_success,
            rules: self.rules.clone(),
            filter: self.filter.clone(),
        }
    }
}

fn parse_bool(var: &'static str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_repo_list(var: &'static str, value: Option<String>) -> Result<Vec<RepoId>, ConfigError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            RepoId::parse(s).ok_or_else(|| ConfigError::Invalid {
                var,
                value: s.to_string(),
                reason: "expected owner/repo".to_string(),
            })
        })
        .collect()
}
