//! Word-anchored diff.
//!
//! Both strings are split on whitespace and compared position by position.
//! Runs of differing words become edit windows; windows separated by only a
//! few unchanged words are merged so a single amendment is not shown as many
//! tiny highlighted islands. Output text is re-joined with single spaces.

use std::ops::Range;

use lex_types::{Span, SpanKind};

/// Default number of unchanged words that may sit inside one merged window.
pub const DEFAULT_MERGE_GAP: usize = 3;

/// Compute the word-anchored diff of `base` against `candidate`.
///
/// Windows whose gap is `merge_gap` unchanged words or fewer are merged.
/// Words past the end of the shorter string form a trailing window.
pub fn diff_words(base: &str, candidate: &str, merge_gap: usize) -> Vec<Span> {
    let bw: Vec<&str> = base.split_whitespace().collect();
    let cw: Vec<&str> = candidate.split_whitespace().collect();
    let windows = edit_windows(&bw, &cw, merge_gap);

    let mut spans = Vec::new();
    let mut cursor = 0;
    for window in windows {
        push(&mut spans, SpanKind::Unchanged, words(&bw, cursor..window.start));
        push(&mut spans, SpanKind::Removed, words(&bw, window.start..window.end.min(bw.len())));
        push(&mut spans, SpanKind::Added, words(&cw, window.start..window.end.min(cw.len())));
        cursor = window.end;
    }
    push(&mut spans, SpanKind::Unchanged, words(&bw, cursor..bw.len()));
    spans
}

/// Index ranges (over the aligned word positions) that differ, merged by gap.
fn edit_windows(bw: &[&str], cw: &[&str], merge_gap: usize) -> Vec<Range<usize>> {
    let overlap = bw.len().min(cw.len());
    let mut runs: Vec<Range<usize>> = Vec::new();

    let mut i = 0;
    while i < overlap {
        if bw[i] == cw[i] {
            i += 1;
            continue;
        }
        let start = i;
        while i < overlap && bw[i] != cw[i] {
            i += 1;
        }
        runs.push(start..i);
    }
    if bw.len() != cw.len() {
        runs.push(overlap..bw.len().max(cw.len()));
    }

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if run.start - last.end <= merge_gap => last.end = run.end,
            _ => merged.push(run),
        }
    }
    merged
}

/// Text of `range` of one side; every word but the side's first is preceded
/// by a single space, so concatenating a side's spans rebuilds it exactly.
fn words(side: &[&str], range: Range<usize>) -> String {
    let mut out = String::new();
    for i in range {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(side[i]);
    }
    out
}

fn push(spans: &mut Vec<Span>, kind: SpanKind, text: String) {
    if !text.is_empty() {
        spans.push(Span::new(kind, text));
    }
}

#[cfg(test)]
mod tests {
    use lex_types::{base_text, candidate_text};
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn single_word_replacement() {
        let spans = diff_words("the tax shall be paid", "the fee shall be paid", 3);
        assert_eq!(
            spans,
            vec![
                Span::unchanged("the"),
                Span::removed(" tax"),
                Span::added(" fee"),
                Span::unchanged(" shall be paid"),
            ]
        );
    }

    #[test]
    fn nearby_edits_merge_into_one_window() {
        // Edits at positions 1 and 4 with two unchanged words between.
        let spans = diff_words("a b c d e f", "a X c d Y f", 3);
        assert_eq!(
            spans,
            vec![
                Span::unchanged("a"),
                Span::removed(" b c d e"),
                Span::added(" X c d Y"),
                Span::unchanged(" f"),
            ]
        );
    }

    #[test]
    fn distant_edits_stay_separate() {
        let spans = diff_words("a b c d e f g h", "X b c d e f g Y", 3);
        let removed: Vec<_> = spans.iter().filter(|s| s.kind == SpanKind::Removed).collect();
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].text, "a");
        assert_eq!(removed[1].text, " h");
    }

    #[test]
    fn gap_of_exactly_three_merges() {
        let spans = diff_words("a b c d e", "X b c d Y", 3);
        assert_eq!(spans.iter().filter(|s| s.kind == SpanKind::Removed).count(), 1);
        let spans = diff_words("a b c d e f", "X b c d e Y", 3);
        assert_eq!(spans.iter().filter(|s| s.kind == SpanKind::Removed).count(), 2);
    }

    #[test]
    fn trailing_words_form_a_window() {
        let spans = diff_words("pay the tax", "pay the tax and penalties", 3);
        assert_eq!(spans, vec![Span::unchanged("pay the tax"), Span::added(" and penalties")]);
    }

    #[test]
    fn trailing_window_merges_with_close_edit() {
        let spans = diff_words("a b c", "a X c d", 3);
        assert_eq!(
            spans,
            vec![Span::unchanged("a"), Span::removed(" b c"), Span::added(" X c d")]
        );
    }

    #[test]
    fn identical_text_is_one_unchanged_span() {
        let spans = diff_words("no  change\there", "no change here", 3);
        assert_eq!(spans, vec![Span::unchanged("no change here")]);
    }

    #[test]
    fn empty_inputs() {
        assert!(diff_words("", "", 3).is_empty());
        assert_eq!(diff_words("", "new", 3), vec![Span::added("new")]);
        assert_eq!(diff_words("old", "", 3), vec![Span::removed("old")]);
    }

    proptest! {
        #[test]
        fn sides_rebuild_normalized_text(
            base in prop::collection::vec("[abc]{1,3}", 0..12),
            candidate in prop::collection::vec("[abc]{1,3}", 0..12),
            gap in 0usize..5,
        ) {
            let spans = diff_words(&base.join(" "), &candidate.join(" "), gap);
            prop_assert_eq!(base_text(&spans), base.join(" "));
            prop_assert_eq!(candidate_text(&spans), candidate.join(" "));
        }
    }
}
