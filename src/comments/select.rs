//! Selection of the comment window a trigger decision looks at.

use tracing::trace;

use crate::types::Comment;

use super::classify::CommentKind;

/// A comment picked by [`select_relevant`], together with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevantComment<'a> {
    pub comment: &'a Comment,
    pub kind: CommentKind,
}

/// Selects the comments relevant to a trigger decision, newest first.
///
/// Walks the history from newest to oldest, skipping empty comments, and keeps
/// every trigger or ledger comment until the newest trigger comment has been
/// kept. Nothing older than that trigger comment is returned.
///
/// The input is left untouched; the result borrows from it.
pub fn select_relevant<'a>(
    comments: &'a [Comment],
    trigger_phrase: Option<&str>,
) -> Vec<RelevantComment<'a>> {
    let mut ordered: Vec<&Comment> = comments.iter().collect();
    ordered.sort_unstable_by(|a, b| b.cmp(a));

    let mut selected = Vec::new();
    for comment in ordered {
        let Some(text) = comment.text() else {
            continue;
        };
        let kind = CommentKind::of(text, trigger_phrase);
        trace!(
            comment_id = %comment.id,
            trigger = kind.trigger,
            ledger = kind.ledger,
            "Classified comment"
        );
        if kind.is_relevant() {
            selected.push(RelevantComment { comment, kind });
        }
        if kind.trigger {
            break;
        }
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{arb_comments, at};
    use proptest::prelude::*;

    fn ids(selected: &[RelevantComment<'_>]) -> Vec<u64> {
        selected.iter().map(|r| r.comment.id.0).collect()
    }

    #[test]
    fn stops_at_newest_trigger() {
        let comments = vec![
            Comment::new(1, "unrelated", at(1)),
            Comment::new(2, "TTP build flag ```[bid: #k]```", at(2)),
            Comment::new(3, "test this please", at(3)),
        ];
        let selected = select_relevant(&comments, None);
        assert_eq!(ids(&selected), vec![3]);
    }

    #[test]
    fn keeps_ledgers_newer_than_trigger() {
        let comments = vec![
            Comment::new(1, "test this please", at(1)),
            Comment::new(2, "TTP build flag ```[bid: #k]```", at(2)),
            Comment::new(3, "unrelated", at(3)),
        ];
        let selected = select_relevant(&comments, None);
        assert_eq!(ids(&selected), vec![2, 1]);
        assert!(selected[0].kind.ledger);
        assert!(selected[1].kind.trigger);
    }

    #[test]
    fn ignores_older_triggers() {
        let comments = vec![
            Comment::new(1, "test this please", at(1)),
            Comment::new(2, "test this please", at(2)),
        ];
        assert_eq!(ids(&select_relevant(&comments, None)), vec![2]);
    }

    #[test]
    fn skips_empty_comments() {
        let mut empty = Comment::new(2, "", at(2));
        empty.content = None;
        let comments = vec![Comment::new(1, "test this please", at(1)), empty];
        assert_eq!(ids(&select_relevant(&comments, None)), vec![1]);
    }

    #[test]
    fn ties_broken_by_id() {
        let comments = vec![
            Comment::new(9, "test this please", at(5)),
            Comment::new(4, "TTP build flag", at(5)),
        ];
        // Same timestamp: id 9 is newer, so it is the trigger and stops the walk.
        assert_eq!(ids(&select_relevant(&comments, None)), vec![9]);
    }

    #[test]
    fn uses_configured_phrase() {
        let comments = vec![
            Comment::new(1, "retest", at(1)),
            Comment::new(2, "test this please", at(2)),
        ];
        assert_eq!(ids(&select_relevant(&comments, Some("retest"))), vec![1]);
    }

    #[test]
    fn no_relevant_comments() {
        let comments = vec![Comment::new(1, "ship it", at(1))];
        assert!(select_relevant(&comments, None).is_empty());
        assert!(select_relevant(&[], None).is_empty());
    }

    proptest! {
        #[test]
        fn selection_is_descending_and_ends_at_first_trigger(comments in arb_comments()) {
            let selected = select_relevant(&comments, None);

            for pair in selected.windows(2) {
                prop_assert!(pair[0].comment > pair[1].comment);
            }
            let triggers = selected.iter().filter(|r| r.kind.trigger).count();
            prop_assert!(triggers <= 1);
            if triggers == 1 {
                prop_assert!(selected.last().unwrap().kind.trigger);
            }
        }

        #[test]
        fn selection_ignores_input_order(mut comments in arb_comments()) {
            let forward: Vec<_> = select_relevant(&comments, None)
                .iter()
                .map(|r| r.comment.id)
                .collect();
            comments.reverse();
            let backward: Vec<_> = select_relevant(&comments, None)
                .iter()
                .map(|r| r.comment.id)
                .collect();
            prop_assert_eq!(forward, backward);
        }
    }
}
