//! Pull request filtering: title skip phrases and branch inclusion rules.
//!
//! A pull request is only considered for a build if its title contains none of
//! the configured skip phrases *and* the branch filter approves it. The branch
//! filter comes in two variants:
//!
//! - [`BranchFilter::Pattern`] matches the target branch against glob patterns.
//! - [`BranchFilter::Scm`] requires the target branch to be one that a
//!   configured SCM source has discovered.

mod pattern;
mod scm;

use tracing::trace;

pub use pattern::{BranchPattern, InvalidPattern};
pub use scm::ScmSource;

use crate::types::{BranchCandidate, RepoId};

/// Comma-separated phrases that, when found in a title, suppress builds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkipPhrases(Vec<String>);

impl SkipPhrases {
    /// Parses a comma-separated list. Phrases are trimmed and lowercased; blank
    /// entries are dropped.
    pub fn parse(raw: &str) -> Self {
        SkipPhrases(
            raw.split(',')
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }

    /// Returns the first phrase contained in `title`, ignoring case.
    pub fn matching(&self, title: &str) -> Option<&str> {
        let title = title.to_lowercase();
        self.0
            .iter()
            .find(|phrase| title.contains(phrase.as_str()))
            .map(String::as_str)
    }
}

/// How the branch filter is configured, before SCM branches are discovered.
#[derive(Debug, Clone)]
pub enum FilterMode {
    /// Match target branches against glob patterns.
    Pattern(BranchPattern),

    /// Approve target branches discovered in any of these repositories.
    ScmIncludes(Vec<RepoId>),
}

impl FilterMode {
    /// Selects the filter variant the way the trigger configuration does.
    pub fn select(filter_by_scm_includes: bool, pattern: BranchPattern, sources: Vec<RepoId>) -> Self {
        if filter_by_scm_includes {
            FilterMode::ScmIncludes(sources)
        } else {
            FilterMode::Pattern(pattern)
        }
    }
}

/// A resolved branch filter, ready to approve candidates.
#[derive(Debug, Clone)]
pub enum BranchFilter {
    Pattern(BranchPattern),
    Scm(Vec<ScmSource>),
}

impl BranchFilter {
    /// Returns true if the candidate may be built.
    pub fn approved(&self, candidate: &BranchCandidate<'_>) -> bool {
        let approved = match self {
            BranchFilter::Pattern(pattern) => pattern.matches(candidate.target_branch),
            BranchFilter::Scm(sources) => sources
                .iter()
                .any(|source| source.has_branch(candidate.target_branch)),
        };
        trace!(
            source_branch = candidate.source_branch,
            target_branch = candidate.target_branch,
            approved,
            "Branch filter evaluated"
        );
        approved
    }
}
