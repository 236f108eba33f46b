//! Styled span sequences.
//!
//! Renderers never see raw diff machinery: every field reaches them as a
//! [`FieldValue`], either plain text, text with resolved citation links, or a
//! sequence of unchanged/removed/added spans.

use serde::{Deserialize, Serialize};

/// How one span of text should be styled.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SpanKind {
    /// Text present in both the base and the amended value.
    Unchanged,
    /// Text present only in the base value.
    Removed,
    /// Text present only in the amended value.
    Added,
    /// A navigable cross-reference.
    Citation { href: String },
}

/// A run of text with one style.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    #[serde(flatten)]
    pub kind: SpanKind,
    pub text: String,
}

impl Span {
    pub fn new(kind: SpanKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn unchanged(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Unchanged, text)
    }

    pub fn removed(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Removed, text)
    }

    pub fn added(text: impl Into<String>) -> Self {
        Self::new(SpanKind::Added, text)
    }

    pub fn citation(href: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(SpanKind::Citation { href: href.into() }, text)
    }

    /// Returns `true` if this span belongs to the base (pre-amendment) text.
    pub fn in_base(&self) -> bool {
        !matches!(self.kind, SpanKind::Added)
    }

    /// Returns `true` if this span belongs to the amended text.
    pub fn in_candidate(&self) -> bool {
        !matches!(self.kind, SpanKind::Removed)
    }
}

/// Reassemble the base text from a span sequence.
pub fn base_text(spans: &[Span]) -> String {
    spans
        .iter()
        .filter(|s| s.in_base())
        .map(|s| s.text.as_str())
        .collect()
}

/// Reassemble the amended text from a span sequence.
pub fn candidate_text(spans: &[Span]) -> String {
    spans
        .iter()
        .filter(|s| s.in_candidate())
        .map(|s| s.text.as_str())
        .collect()
}

/// The rendered value of one field.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "style", content = "value", rename_all = "snake_case")]
pub enum FieldValue {
    /// Unstyled text.
    Plain(String),
    /// Undiffed text whose citation markup was resolved into links.
    Linked(Vec<Span>),
    /// Raw diff spans; citations are never resolved here.
    Diffed(Vec<Span>),
}

impl FieldValue {
    /// Returns `true` if this value carries diff spans.
    pub fn is_diffed(&self) -> bool {
        matches!(self, Self::Diffed(_))
    }

    /// The text a reader sees once the value is applied (amended text for
    /// diffed values).
    pub fn display_text(&self) -> String {
        match self {
            Self::Plain(s) => s.clone(),
            Self::Linked(spans) | Self::Diffed(spans) => candidate_text(spans),
        }
    }

    /// The spans of a styled value, if any.
    pub fn spans(&self) -> Option<&[Span]> {
        match self {
            Self::Plain(_) => None,
            Self::Linked(spans) | Self::Diffed(spans) => Some(spans),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Plain(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Plain(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Span> {
        vec![
            Span::unchanged("Section 5 is "),
            Span::removed(""),
            Span::added("hereby "),
            Span::unchanged("amended"),
        ]
    }

    #[test]
    fn base_and_candidate_reassembly() {
        let spans = sample();
        assert_eq!(base_text(&spans), "Section 5 is amended");
        assert_eq!(candidate_text(&spans), "Section 5 is hereby amended");
    }

    #[test]
    fn citations_belong_to_both_sides() {
        let span = Span::citation("/us/usc/t26/s1", "section 1");
        assert!(span.in_base());
        assert!(span.in_candidate());
    }

    #[test]
    fn display_text_of_each_style() {
        assert_eq!(FieldValue::from("x").display_text(), "x");
        assert_eq!(FieldValue::Diffed(sample()).display_text(), "Section 5 is hereby amended");
        let linked = FieldValue::Linked(vec![
            Span::unchanged("see "),
            Span::citation("/us/usc/t1/s1", "section 1"),
        ]);
        assert_eq!(linked.display_text(), "see section 1");
        assert!(!linked.is_diffed());
    }

    #[test]
    fn span_json_shape() {
        let json = serde_json::to_value(Span::citation("/a", "b")).unwrap();
        assert_eq!(json["kind"], "citation");
        assert_eq!(json["href"], "/a");
        assert_eq!(json["text"], "b");

        let json = serde_json::to_value(FieldValue::Diffed(vec![Span::added("x")])).unwrap();
        assert_eq!(json["style"], "diffed");
        assert_eq!(json["value"][0]["kind"], "added");
    }
}
