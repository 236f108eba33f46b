//! Nested output nodes.
//!
//! Internally every tree is an id-keyed arena; these types are the nested,
//! JSON-serializable views handed to the rendering layer.

use serde::{Deserialize, Serialize};

use crate::id::{ContentId, DiffId};
use crate::record::ContentRecord;
use crate::span::FieldValue;

fn is_false(b: &bool) -> bool {
    !*b
}

/// Per-node field rendering computed by the diff layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rendering {
    pub section_display: FieldValue,
    pub heading: Option<FieldValue>,
    pub content_str: FieldValue,
    /// At least one field carries diff spans.
    pub diffed: bool,
    /// Sibling position after any diff nudge.
    pub order_number: f64,
}

impl Rendering {
    /// The unstyled rendering of a record.
    pub fn plain(record: &ContentRecord) -> Self {
        Self {
            section_display: FieldValue::Plain(record.section_display.clone()),
            heading: record.heading.clone().map(FieldValue::Plain),
            content_str: FieldValue::Plain(record.content_str.clone()),
            diffed: false,
            order_number: record.order_number,
        }
    }
}

/// Fields shared by plain and merged output nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeBody {
    /// `None` only for ident-path placeholders.
    pub id: Option<ContentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ident: Option<String>,
    pub order_number: f64,
    pub section_display: FieldValue,
    pub heading: Option<FieldValue>,
    pub content_str: FieldValue,
    pub content_type: String,
    /// Synthesized for a parent that has no record of its own.
    #[serde(default, skip_serializing_if = "is_false")]
    pub placeholder: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub diffed: bool,
}

impl NodeBody {
    /// Body of a real record, using `rendering` when the diff layer produced one.
    pub fn from_record(record: &ContentRecord, rendering: Option<&Rendering>) -> Self {
        let rendering = rendering.cloned().unwrap_or_else(|| Rendering::plain(record));
        Self {
            id: Some(record.id),
            ident: record.ident.clone(),
            order_number: rendering.order_number,
            section_display: rendering.section_display,
            heading: rendering.heading,
            content_str: rendering.content_str,
            content_type: record.content_type.clone(),
            placeholder: false,
            diffed: rendering.diffed,
        }
    }

    /// Body of a synthesized placeholder.
    pub fn placeholder(id: Option<ContentId>, ident: Option<String>) -> Self {
        let section_display = ident
            .as_deref()
            .and_then(|p| p.rsplit('/').next())
            .unwrap_or_default()
            .to_string();
        Self {
            id,
            ident,
            order_number: 0.0,
            section_display: FieldValue::Plain(section_display),
            heading: None,
            content_str: FieldValue::Plain(String::new()),
            content_type: String::new(),
            placeholder: true,
            diffed: false,
        }
    }
}

/// A node of an assembled tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(flatten)]
    pub body: NodeBody,
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ContentNode::count).sum::<usize>()
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: ContentId) -> Option<&ContentNode> {
        if self.body.id == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

/// Chapter and section descriptors attached to a diff target at merge time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl SectionMetadata {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.chapter.is_none() && self.section.is_none()
    }
}

/// A node of a merged multi-diff forest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MergedContentNode {
    #[serde(flatten)]
    pub body: NodeBody,
    /// This node is the anchor of at least one amendment.
    #[serde(rename = "isTarget")]
    pub is_target: bool,
    /// This node lies on a chain from a root to some target.
    #[serde(rename = "isOnPath")]
    pub is_on_path: bool,
    /// Amendments anchored at this node, ascending.
    #[serde(rename = "diffIds")]
    pub diff_ids: Vec<DiffId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SectionMetadata>,
    pub children: Vec<MergedContentNode>,
}

impl MergedContentNode {
    /// Total number of nodes in this subtree, including `self`.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(MergedContentNode::count).sum::<usize>()
    }

    /// Depth-first search for a node by id.
    pub fn find(&self, id: ContentId) -> Option<&MergedContentNode> {
        if self.body.id == Some(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Span;

    fn record(id: u64) -> ContentRecord {
        ContentRecord::new(ContentId::new(id), None)
            .with_section_display(format!("§ {id}"))
            .with_content("text")
    }

    #[test]
    fn body_from_plain_record() {
        let body = NodeBody::from_record(&record(3).with_order(2.5), None);
        assert_eq!(body.id, Some(ContentId::new(3)));
        assert_eq!(body.order_number, 2.5);
        assert_eq!(body.content_str, FieldValue::Plain("text".into()));
        assert!(body.heading.is_none());
        assert!(!body.placeholder);
    }

    #[test]
    fn body_prefers_rendering() {
        let rec = record(3);
        let mut rendering = Rendering::plain(&rec);
        rendering.content_str = FieldValue::Diffed(vec![Span::removed("text"), Span::added("words")]);
        rendering.diffed = true;
        rendering.order_number -= 0.01;
        let body = NodeBody::from_record(&rec, Some(&rendering));
        assert!(body.diffed);
        assert!(body.content_str.is_diffed());
        assert!(body.order_number < rec.order_number);
    }

    #[test]
    fn placeholder_takes_display_from_last_segment() {
        let body = NodeBody::placeholder(None, Some("/us/usc/t26".into()));
        assert!(body.placeholder);
        assert_eq!(body.section_display, FieldValue::Plain("t26".into()));
    }

    #[test]
    fn merged_node_uses_camel_case_flags() {
        let node = MergedContentNode {
            body: NodeBody::from_record(&record(1), None),
            is_target: true,
            is_on_path: true,
            diff_ids: vec![DiffId::new(4)],
            metadata: None,
            children: vec![],
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["isTarget"], true);
        assert_eq!(json["isOnPath"], true);
        assert_eq!(json["diffIds"][0], 4);
        assert_eq!(json["id"], 1);
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn find_and_count_walk_children() {
        let leaf = ContentNode {
            body: NodeBody::from_record(&record(2), None),
            children: vec![],
        };
        let root = ContentNode {
            body: NodeBody::from_record(&record(1), None),
            children: vec![leaf],
        };
        assert_eq!(root.count(), 2);
        assert!(root.find(ContentId::new(2)).is_some());
        assert!(root.find(ContentId::new(9)).is_none());
    }
}
