//! The build target decision.
//!
//! For one pull request and one build key, combines three signals into a
//! single "build now?" answer:
//!
//! 1. Pull request state, title and branches (cheap, local).
//! 2. Whether the source commit already carries a status for the build key.
//! 3. The newest rebuild request in the comment history, and whether this
//!    build key has already recorded a ledger tag for it.
//!
//! Nothing is remembered between polls. The only memory is what the hosting
//! platform holds: recorded commit statuses and posted ledger comments.

use std::fmt;

use serde::Serialize;
use tracing::{debug, instrument};

use crate::comments::{
    LEDGER_COMMENT_PREAMBLE, parse_ledger_tags, render_ledger_append, select_relevant,
};
use crate::effects::HostInterpreter;
use crate::filter::{BranchFilter, SkipPhrases};
use crate::types::{BranchCandidate, BuildKey, PrId, PullRequest};

use super::calls;
use super::error::DecisionError;

/// Comment and title rules applied to every pull request.
#[derive(Debug, Clone, Default)]
pub struct TriggerRules {
    /// Phrase that requests a rebuild; blank means the default phrase.
    pub comment_trigger: Option<String>,
    pub skip_phrases: SkipPhrases,
}

/// A ledger comment the orchestrator must post when acting on a decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerPost {
    pub pr: PrId,
    pub body: String,
}

/// Why a decision came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DecisionReason {
    NotOpen,
    SkipPhrase { phrase: String },
    FilterRejected,
    AlreadyProcessed,
    RebuildRequested,
    NotYetBuilt,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::NotOpen => write!(f, "not open"),
            DecisionReason::SkipPhrase { phrase } => write!(f, "skip phrase {:?} in title", phrase),
            DecisionReason::FilterRejected => write!(f, "rejected by branch filter"),
            DecisionReason::AlreadyProcessed => write!(f, "commit already processed"),
            DecisionReason::RebuildRequested => write!(f, "rebuild requested"),
            DecisionReason::NotYetBuilt => write!(f, "commit not yet built"),
        }
    }
}

/// The outcome of [`decide`] for one pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub trigger: bool,
    pub reason: DecisionReason,
    pub ledger_post: Option<LedgerPost>,
}

impl Decision {
    fn skip(reason: DecisionReason) -> Self {
        Decision {
            trigger: false,
            reason,
            ledger_post: None,
        }
    }
}

/// Decides whether `pr` should be built for `key`.
///
/// Returns [`DecisionError::MissingSourceCommit`] for an open, unfiltered pull
/// request without a source commit rather than quietly declining it.
#[instrument(skip_all, fields(pr = %pr.id, build_key = %key))]
pub async fn decide<H>(
    host: &H,
    rules: &TriggerRules,
    filter: &BranchFilter,
    pr: &PullRequest,
    key: &BuildKey,
) -> Result<Decision, DecisionError>
where
    H: HostInterpreter,
    H::Error: fmt::Display,
{
    if !pr.state.is_open() {
        return Ok(Decision::skip(DecisionReason::NotOpen));
    }

    let skip_phrase = rules.skip_phrases.matching(&pr.title);
    let filtered = filter.approved(&BranchCandidate::from(pr));
    if skip_phrase.is_some() || !filtered {
        debug!(
            title = %pr.title,
            skip = skip_phrase.is_some(),
            filtered,
            "Skipping build"
        );
        let reason = match skip_phrase {
            Some(phrase) => DecisionReason::SkipPhrase {
                phrase: phrase.to_string(),
            },
            None => DecisionReason::FilterRejected,
        };
        return Ok(Decision::skip(reason));
    }

    let sha = pr
        .source
        .commit
        .clone()
        .ok_or_else(|| DecisionError::MissingSourceCommit { pr: pr.id.clone() })?;

    let already_processed =
        calls::has_build_status(host, pr.source_repo(), sha.clone(), key.clone()).await?;
    if already_processed {
        debug!(sha = %sha, "Commit has already been processed");
    }

    let comments = calls::list_comments(host, pr.destination_repo(), pr.id.clone()).await?;

    let my_tag = key.tag();
    let mut rebuild_requested = false;
    let mut has_my_tag = false;
    for relevant in select_relevant(&comments, rules.comment_trigger.as_deref()) {
        if relevant.kind.trigger {
            rebuild_requested = true;
            debug!(
                sha = %sha,
                comment_id = %relevant.comment.id,
                "Rebuild comment available"
            );
        }
        if relevant.kind.ledger {
            let text = relevant.comment.text().unwrap_or_default();
            has_my_tag |= parse_ledger_tags(text).contains(&my_tag);
        }
    }
    rebuild_requested &= !has_my_tag;

    let ledger_post = rebuild_requested.then(|| LedgerPost {
        pr: pr.id.clone(),
        body: render_ledger_append(LEDGER_COMMENT_PREAMBLE, &my_tag),
    });

    let trigger = rebuild_requested || !already_processed;
    let reason = if rebuild_requested {
        DecisionReason::RebuildRequested
    } else if already_processed {
        DecisionReason::AlreadyProcessed
    } else {
        DecisionReason::NotYetBuilt
    };

    debug!(
        trigger,
        rebuild = rebuild_requested,
        processed = already_processed,
        "Build target decided"
    );

    Ok(Decision {
        trigger,
        reason,
        ledger_post,
    })
}
