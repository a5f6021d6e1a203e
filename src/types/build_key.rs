//! Build keys: the identifier that scopes a commit status and a ledger tag to
//! one CI job on one hosting target.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned when a build key contains characters a ledger tag cannot carry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid build key {0:?}: must be non-empty and contain only [A-Za-z0-9_-]")]
pub struct InvalidBuildKey(pub String);

/// A validated build key.
///
/// The key doubles as the commit status context and as the payload of the
/// `#<key>` ledger tag, so it is restricted to the characters a tag can hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BuildKey(String);

impl BuildKey {
    /// Validates and wraps a raw key.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidBuildKey> {
        let raw = raw.into();
        if !raw.is_empty() && raw.chars().all(is_tag_char) {
            Ok(BuildKey(raw))
        } else {
            Err(InvalidBuildKey(raw))
        }
    }

    /// Derives a key for `job` under the CI identity `ci_key`.
    ///
    /// The two parts are joined with `-`; any character outside the tag
    /// alphabet (spaces, slashes from folder-style job names) becomes `-`.
    pub fn scoped(ci_key: &str, job: &str) -> Result<Self, InvalidBuildKey> {
        let joined = match (ci_key.trim(), job.trim()) {
            ("", job) => job.to_string(),
            (ci, "") => ci.to_string(),
            (ci, job) => format!("{ci}-{job}"),
        };
        let sanitized: String = joined
            .chars()
            .map(|c| if is_tag_char(c) { c } else { '-' })
            .collect();
        Self::new(sanitized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Renders the ledger tag for this key, `#<key>`.
    pub fn tag(&self) -> String {
        format!("#{}", self.0)
    }
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

impl fmt::Display for BuildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for BuildKey {
    type Error = InvalidBuildKey;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        BuildKey::new(s)
    }
}

impl From<BuildKey> for String {
    fn from(key: BuildKey) -> Self {
        key.0
    }
}
