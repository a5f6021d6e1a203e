//! Classification of pull request comments.
//!
//! Two kinds of comment matter to the trigger: *trigger comments*, where a
//! person or bot asks for a rebuild, and *ledger comments*, which the trigger
//! itself posts to record that a rebuild request was actioned.

/// Phrase used when no trigger phrase is configured.
pub const DEFAULT_COMMENT_TRIGGER: &str = "test this please";

/// Marker identifying a ledger comment (matched case-insensitively).
pub const LEDGER_MARKER: &str = "ttp build flag";

/// Body a freshly posted ledger comment starts from.
pub const LEDGER_COMMENT_PREAMBLE: &str = "TTP build flag";

/// Returns the phrase that identifies trigger comments.
///
/// A configured phrase that is absent or blank falls back to
/// [`DEFAULT_COMMENT_TRIGGER`].
pub fn effective_trigger_phrase(configured: Option<&str>) -> &str {
    match configured {
        Some(phrase) if !phrase.trim().is_empty() => phrase,
        _ => DEFAULT_COMMENT_TRIGGER,
    }
}

/// Returns true if `content` asks for a rebuild.
///
/// The match is a case-sensitive substring search. Empty content never matches.
///
/// # Examples
///
/// ```
/// use pr_build_trigger::comments::is_trigger_comment;
///
/// assert!(is_trigger_comment("LGTM, test this please", None));
/// assert!(!is_trigger_comment("Test This Please", None));
/// assert!(is_trigger_comment("retest", Some("retest")));
/// assert!(!is_trigger_comment("", Some("retest")));
/// ```
pub fn is_trigger_comment(content: &str, configured_phrase: Option<&str>) -> bool {
    !content.is_empty() && content.contains(effective_trigger_phrase(configured_phrase))
}

/// Returns true if `content` is a ledger comment.
pub fn is_ledger_comment(content: &str) -> bool {
    content.to_lowercase().contains(LEDGER_MARKER)
}

/// How a single comment is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommentKind {
    pub trigger: bool,
    pub ledger: bool,
}

impl CommentKind {
    /// Classifies `content` against the configured trigger phrase.
    pub fn of(content: &str, configured_phrase: Option<&str>) -> Self {
        CommentKind {
            trigger: is_trigger_comment(content, configured_phrase),
            ledger: is_ledger_comment(content),
        }
    }

    /// True if the comment is either a trigger or a ledger comment.
    pub fn is_relevant(&self) -> bool {
        self.trigger || self.ledger
    }
}
