//! Character-anchored diff.
//!
//! Finds the longest common prefix and suffix of the two strings and treats
//! everything between them as one replaced region. The prefix boundary is
//! pulled back to the previous whitespace when it would otherwise cut a word
//! in half, so highlights always start on a word.

use lex_types::Span;

/// The four regions of a character-anchored diff.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharDiff {
    /// Text shared at the start of both strings.
    pub prefix: String,
    /// Base text between prefix and suffix.
    pub removed: String,
    /// Candidate text between prefix and suffix.
    pub added: String,
    /// Text shared at the end of both strings.
    pub suffix: String,
}

impl CharDiff {
    /// Returns `true` if nothing was removed or added.
    pub fn is_unchanged(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// `unchanged(prefix)`, `removed`, `added`, `unchanged(suffix)`, always in
    /// that order and always four spans.
    pub fn spans(&self) -> Vec<Span> {
        vec![
            Span::unchanged(self.prefix.clone()),
            Span::removed(self.removed.clone()),
            Span::added(self.added.clone()),
            Span::unchanged(self.suffix.clone()),
        ]
    }

    pub fn base(&self) -> String {
        [self.prefix.as_str(), &self.removed, &self.suffix].concat()
    }

    pub fn candidate(&self) -> String {
        [self.prefix.as_str(), &self.added, &self.suffix].concat()
    }
}

/// Compute the character-anchored diff of `base` against `candidate`.
pub fn diff_chars(base: &str, candidate: &str) -> CharDiff {
    let b: Vec<(usize, char)> = base.char_indices().collect();
    let c: Vec<(usize, char)> = candidate.char_indices().collect();
    let shortest = b.len().min(c.len());

    let mut prefix = 0;
    while prefix < shortest && b[prefix].1 == c[prefix].1 {
        prefix += 1;
    }
    prefix = snap_to_word_start(&b, &c, prefix);

    let limit = shortest - prefix;
    let mut suffix = 0;
    while suffix < limit && b[b.len() - 1 - suffix].1 == c[c.len() - 1 - suffix].1 {
        suffix += 1;
    }

    let b_at = |i: usize| b.get(i).map_or(base.len(), |(off, _)| *off);
    let c_at = |i: usize| c.get(i).map_or(candidate.len(), |(off, _)| *off);
    let b_mid = b_at(prefix);
    let b_end = b_at(b.len() - suffix);
    let c_mid = c_at(prefix);
    let c_end = c_at(c.len() - suffix);

    CharDiff {
        prefix: base[..b_mid].to_string(),
        removed: base[b_mid..b_end].to_string(),
        added: candidate[c_mid..c_end].to_string(),
        suffix: base[b_end..].to_string(),
    }
}

/// Move `prefix` back to just after the previous whitespace if the boundary
/// falls inside a word on either side.
fn snap_to_word_start(b: &[(usize, char)], c: &[(usize, char)], prefix: usize) -> usize {
    if prefix == 0 || b[prefix - 1].1.is_whitespace() {
        return prefix;
    }
    let continues = |s: &[(usize, char)]| s.get(prefix).is_some_and(|(_, ch)| !ch.is_whitespace());
    if !continues(b) && !continues(c) {
        return prefix;
    }
    let mut snapped = prefix;
    while snapped > 0 && !b[snapped - 1].1.is_whitespace() {
        snapped -= 1;
    }
    snapped
}
