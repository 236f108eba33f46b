//! Cross-reference markup inside `content_str`.
//!
//! Citations are written as `<ref href="/us/usc/t26/s501">section 501</ref>`.
//! Before diffing, markup is stripped down to its visible text; for nodes
//! that are not diffed it is resolved into navigable citation spans instead.

use std::ops::Range;

use regex::Regex;

use lex_types::Span;

use crate::error::{DiffError, DiffResult};

const CITATION_REGEX: &str = r#"(?s)<ref\s+href="([^"]*)"\s*>(.*?)</ref>"#;
const OPEN_TAG: &str = "<ref";
const CLOSE_TAG: &str = "</ref>";

/// One well-formed citation found in a field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Citation {
    pub href: String,
    /// Visible text between the tags.
    pub text: String,
    /// Byte range of the whole element in the source string.
    pub range: Range<usize>,
}

/// Finds, strips and resolves citation markup.
#[derive(Clone, Debug)]
pub struct CitationParser {
    pattern: Regex,
}

impl CitationParser {
    pub fn new() -> DiffResult<Self> {
        Ok(Self {
            pattern: Regex::new(CITATION_REGEX)?,
        })
    }

    /// Returns `true` if `s` contains anything that looks like citation markup.
    pub fn has_markup(s: &str) -> bool {
        s.contains(OPEN_TAG) || s.contains(CLOSE_TAG)
    }

    /// Every citation in `s`, in order.
    ///
    /// Fails on stray or nested tags and on empty `href`s.
    pub fn citations(&self, s: &str) -> DiffResult<Vec<Citation>> {
        let mut out = Vec::new();
        let mut cursor = 0;
        for caps in self.pattern.captures_iter(s) {
            let (Some(whole), Some(href), Some(text)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            check_plain(s, cursor..whole.start())?;
            if href.as_str().is_empty() {
                return Err(malformed(whole.start(), "citation has an empty href"));
            }
            if text.as_str().contains(OPEN_TAG) {
                return Err(malformed(text.start(), "nested citation"));
            }
            out.push(Citation {
                href: href.as_str().to_string(),
                text: text.as_str().to_string(),
                range: whole.range(),
            });
            cursor = whole.end();
        }
        check_plain(s, cursor..s.len())?;
        Ok(out)
    }

    /// Replace every citation with its visible text.
    pub fn strip(&self, s: &str) -> DiffResult<String> {
        let mut out = String::with_capacity(s.len());
        let mut cursor = 0;
        for citation in self.citations(s)? {
            out.push_str(&s[cursor..citation.range.start]);
            out.push_str(&citation.text);
            cursor = citation.range.end;
        }
        out.push_str(&s[cursor..]);
        Ok(out)
    }

    /// Split `s` into plain spans and citation spans.
    pub fn resolve(&self, s: &str) -> DiffResult<Vec<Span>> {
        let mut spans = Vec::new();
        let mut cursor = 0;
        for citation in self.citations(s)? {
            if citation.range.start > cursor {
                spans.push(Span::unchanged(&s[cursor..citation.range.start]));
            }
            spans.push(Span::citation(citation.href, citation.text));
            cursor = citation.range.end;
        }
        if cursor < s.len() {
            spans.push(Span::unchanged(&s[cursor..]));
        }
        Ok(spans)
    }
}

/// Text outside citations must not contain any tag fragments.
fn check_plain(s: &str, range: Range<usize>) -> DiffResult<()> {
    let gap = &s[range.clone()];
    match (gap.find(OPEN_TAG), gap.find(CLOSE_TAG)) {
        (None, None) => Ok(()),
        (Some(i), _) => Err(malformed(range.start + i, "unterminated citation")),
        (None, Some(i)) => Err(malformed(range.start + i, "closing tag without citation")),
    }
}

fn malformed(offset: usize, reason: &str) -> DiffError {
    DiffError::MalformedMarkup {
        offset,
        reason: reason.to_string(),
    }
}
