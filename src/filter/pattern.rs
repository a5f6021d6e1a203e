//! Glob-style branch patterns.

use regex::Regex;
use thiserror::Error;

/// Error returned when a branch pattern cannot be compiled.
#[derive(Debug, Error)]
#[error("invalid branch pattern {pattern:?}: {source}")]
pub struct InvalidPattern {
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// A set of whitespace-separated glob patterns matched against branch names.
///
/// `*` matches any run of characters (including `/`), `?` matches exactly one
/// character and everything else is literal. An empty pattern set matches
/// every branch.
#[derive(Debug, Clone)]
pub struct BranchPattern {
    source: String,
    globs: Vec<Regex>,
}

impl BranchPattern {
    /// Compiles `pattern`.
    pub fn parse(pattern: &str) -> Result<Self, InvalidPattern> {
        let globs = pattern
            .split_whitespace()
            .map(|glob| {
                Regex::new(&glob_to_regex(glob)).map_err(|source| InvalidPattern {
                    pattern: glob.to_string(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BranchPattern {
            source: pattern.trim().to_string(),
            globs,
        })
    }

    /// A pattern that matches every branch.
    pub fn any() -> Self {
        BranchPattern {
            source: String::new(),
            globs: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.globs.is_empty()
    }

    /// Returns true if `branch` matches any glob (or there are no globs).
    pub fn matches(&self, branch: &str) -> bool {
        self.is_empty() || self.globs.iter().any(|re| re.is_match(branch))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Translates one glob into an anchored regular expression.
fn glob_to_regex(glob: &str) -> String {
    let mut re = String::with_capacity(glob.len() + 8);
    re.push('^');
    for c in glob.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            c => re.push_str(&regex::escape(&c.to_string())),
        }
    }
    re.push('$');
    re
}
