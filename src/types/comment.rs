//! Pull request comments.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::CommentId;

/// A comment on a pull request.
///
/// Comments are totally ordered by creation time, ties broken by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,

    /// The comment body. Deleted or attachment-only comments may have none.
    pub content: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(id: u64, content: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Comment {
            id: CommentId(id),
            content: Some(content.into()),
            created_at,
        }
    }

    /// The body, if present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.content.as_deref().filter(|s| !s.is_empty())
    }
}

impl Ord for Comment {
    fn cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Comment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
