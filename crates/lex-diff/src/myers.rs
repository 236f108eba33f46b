//! Word-level Myers diff.
//!
//! Uses the `similar` crate to compute a minimal edit script over words and
//! whitespace runs. Unlike the positional word diff, insertions in the middle
//! of a sentence do not shift every following word into the edit window.

use similar::{Algorithm, ChangeTag, TextDiff};

use lex_types::{Span, SpanKind};

/// Compute a word-level Myers diff; adjacent changes of the same kind are
/// coalesced into one span.
pub fn diff_myers(base: &str, candidate: &str) -> Vec<Span> {
    let diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_words(base, candidate);

    let mut spans: Vec<Span> = Vec::new();
    for change in diff.iter_all_changes() {
        let kind = match change.tag() {
            ChangeTag::Equal => SpanKind::Unchanged,
            ChangeTag::Delete => SpanKind::Removed,
            ChangeTag::Insert => SpanKind::Added,
        };
        match spans.last_mut() {
            Some(last) if last.kind == kind => last.text.push_str(change.value()),
            _ => spans.push(Span::new(kind, change.value())),
        }
    }
    spans
}
