//! Flat input records.
//!
//! A [`ContentRecord`] is one row of statutory text as delivered by the fetch
//! layer: it knows its parent only by id (or by ident path), never by
//! reference. A [`DiffRecord`] carries the amended values for one node.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::id::{ContentId, DiffId};

/// One flat content record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: ContentId,
    /// Explicit parent pointer (parent-id mode).
    #[serde(default)]
    pub parent_id: Option<ContentId>,
    /// `/`-delimited hierarchical path (ident-path mode).
    #[serde(default)]
    pub ident: Option<String>,
    /// Sibling position. Rational so amended nodes can be slotted between
    /// existing ones.
    #[serde(default)]
    pub order_number: f64,
    #[serde(default)]
    pub section_display: String,
    /// `None` marks a leaf text node rather than a titled one.
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub content_str: String,
    #[serde(default)]
    pub content_type: String,
}

impl ContentRecord {
    /// Create a record with the given id and parent, order `0.0` and empty
    /// text fields, matching a deserialized record that omits them.
    pub fn new(id: ContentId, parent_id: Option<ContentId>) -> Self {
        Self {
            id,
            parent_id,
            ident: None,
            order_number: 0.0,
            section_display: String::new(),
            heading: None,
            content_str: String::new(),
            content_type: String::new(),
        }
    }

    /// Returns `true` if the record has no parent pointer.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Returns `true` if the record is untitled body text.
    pub fn is_leaf_text(&self) -> bool {
        self.heading.is_none()
    }

    /// The current value of one diffable field, if present.
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Heading => self.heading.as_deref(),
            Field::SectionDisplay => Some(&self.section_display),
            Field::ContentStr => Some(&self.content_str),
        }
    }

    pub fn with_order(mut self, order_number: f64) -> Self {
        self.order_number = order_number;
        self
    }

    pub fn with_ident(mut self, ident: impl Into<String>) -> Self {
        self.ident = Some(ident.into());
        self
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_section_display(mut self, display: impl Into<String>) -> Self {
        self.section_display = display.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content_str = content.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }
}

/// Deterministic sibling order: `order_number` (total order, NaN-safe), then id.
pub fn compare_order(a: &ContentRecord, b: &ContentRecord) -> Ordering {
    a.order_number
        .total_cmp(&b.order_number)
        .then_with(|| a.id.cmp(&b.id))
}

/// An amendment anchored at one content node.
///
/// Each override that is `None` means "no change to this field".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffRecord {
    pub id: DiffId,
    /// The content node this amendment targets.
    pub content_id: ContentId,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub section_display: Option<String>,
    #[serde(default)]
    pub content_str: Option<String>,
}

impl DiffRecord {
    /// An amendment with no overrides.
    pub fn new(id: DiffId, content_id: ContentId) -> Self {
        Self {
            id,
            content_id,
            heading: None,
            section_display: None,
            content_str: None,
        }
    }

    /// The amended value of one field, if overridden.
    pub fn field(&self, field: Field) -> Option<&str> {
        match field {
            Field::Heading => self.heading.as_deref(),
            Field::SectionDisplay => self.section_display.as_deref(),
            Field::ContentStr => self.content_str.as_deref(),
        }
    }

    /// Returns `true` if no field is overridden.
    pub fn is_noop(&self) -> bool {
        Field::ALL.iter().all(|f| self.field(*f).is_none())
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_section_display(mut self, display: impl Into<String>) -> Self {
        self.section_display = Some(display.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content_str = Some(content.into());
        self
    }
}

/// The fixed set of fields an amendment may override.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Heading,
    SectionDisplay,
    ContentStr,
}

impl Field {
    /// Every diffable field, in render order.
    pub const ALL: [Field; 3] = [Field::Heading, Field::SectionDisplay, Field::ContentStr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::SectionDisplay => "section_display",
            Self::ContentStr => "content_str",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| TypeError::UnknownField(s.to_string()))
    }
}
