//! The build-tag ledger embedded in ledger comments.
//!
//! # Format
//!
//! ```text
//! TTP build flag ```[bid: #jenkins-app #jenkins-lint]```
//! ```
//!
//! The `bid:` label is case-insensitive and may be followed by one whitespace
//! character. Each tag is `#` followed by `[A-Za-z0-9_-]+`.

use std::sync::LazyLock;

use regex::Regex;

/// Matches the bracketed ledger section. The payload runs greedily to the last
/// `]` on the same line.
static LEDGER_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\[bid:\s?(.*)\]").expect("ledger section regex is valid"));

/// Matches a single build tag.
static BUILD_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#[A-Za-z0-9_-]+").expect("build tag regex is valid"));

/// The tags found in one ledger comment, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LedgerTags(Vec<String>);

impl LedgerTags {
    /// Returns true if `tag` (e.g. `#jenkins-app`) is present, ignoring case.
    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Extracts every `#tag` token from `text`, in order of appearance.
fn scan_tags(text: &str) -> Vec<String> {
    BUILD_TAG
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parses the tags recorded in a ledger comment.
///
/// Only tags inside the first `[bid: ...]` section count. Returns an empty set
/// when the comment has no ledger section.
///
/// # Examples
///
/// ```
/// use pr_build_trigger::comments::parse_ledger_tags;
///
/// let tags = parse_ledger_tags("TTP build flag ```[bid: #a #b-2]```");
/// assert!(tags.contains("#a"));
/// assert!(tags.contains("#B-2"));
/// assert!(parse_ledger_tags("#a but no section").is_empty());
/// ```
pub fn parse_ledger_tags(content: &str) -> LedgerTags {
    match LEDGER_SECTION.captures(content) {
        Some(caps) => {
            let payload = caps.get(1).map_or("", |m| m.as_str()).trim();
            LedgerTags(scan_tags(payload))
        }
        None => LedgerTags::default(),
    }
}

/// Appends a ledger section recording `new_tag` to `existing`.
///
/// Every tag already present anywhere in `existing` is carried over in
/// discovery order, followed by `new_tag`. Repeated tags are kept as-is.
///
/// # Examples
///
/// ```
/// use pr_build_trigger::comments::render_ledger_append;
///
/// assert_eq!(
///     render_ledger_append("TTP build flag", "#jenkins-app"),
///     "TTP build flag ```[bid: #jenkins-app]```"
/// );
/// ```
pub fn render_ledger_append(existing: &str, new_tag: &str) -> String {
    let mut tags = scan_tags(existing);
    tags.push(new_tag.to_string());
    format!("{} ```[bid: {}]```", existing, tags.join(" "))
}
