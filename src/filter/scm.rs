//! SCM sources and their discovered branch sets.

use std::collections::BTreeSet;

use crate::types::RepoId;

/// A configured SCM source together with the branches discovered for it in the
/// current cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScmSource {
    pub repo: RepoId,
    pub branches: BTreeSet<String>,
}

impl ScmSource {
    pub fn new<I, S>(repo: RepoId, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScmSource {
            repo,
            branches: branches.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `branch` was discovered in this source.
    pub fn has_branch(&self, branch: &str) -> bool {
        self.branches.contains(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_branch_is_exact() {
        let source = ScmSource::new(RepoId::new("o", "r"), ["main", "release/1.0"]);
        assert!(source.has_branch("main"));
        assert!(source.has_branch("release/1.0"));
        assert!(!source.has_branch("release"));
        assert!(!source.has_branch("Main"));
    }
}
