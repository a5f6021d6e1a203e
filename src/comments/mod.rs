//! Comment analysis for rebuild requests and the build-tag ledger.
//!
//! # Comment kinds
//!
//! - Trigger comments contain the configured phrase (default `test this please`)
//!   and ask for a rebuild.
//! - Ledger comments contain `TTP build flag` and end with a
//!   `` ```[bid: #key ...]``` `` section listing the build keys that have
//!   already actioned the newest rebuild request.
//!
//! # Example
//!
//! ```
//! use pr_build_trigger::comments::{is_ledger_comment, parse_ledger_tags, render_ledger_append};
//!
//! let body = render_ledger_append("TTP build flag", "#jenkins-app");
//! assert!(is_ledger_comment(&body));
//! assert!(parse_ledger_tags(&body).contains("#jenkins-app"));
//! ```

mod classify;
mod ledger;
mod select;

pub use classify::{
    CommentKind, DEFAULT_COMMENT_TRIGGER, LEDGER_COMMENT_PREAMBLE, LEDGER_MARKER,
    effective_trigger_phrase, is_ledger_comment, is_trigger_comment,
};
pub use ledger::{LedgerTags, parse_ledger_tags, render_ledger_append};
pub use select::{RelevantComment, select_relevant};
