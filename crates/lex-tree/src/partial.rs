//! Partial trees: one amendment target with just enough context around it.
//!
//! A partial tree is the ancestor chain of the target, a sibling window at
//! every level of that chain, and (optionally) the target's own subtree.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use lex_types::{ContentId, ContentRecord, SectionMetadata};

use crate::chain::resolve_chain;
use crate::config::PartialTreeConfig;
use crate::error::TreeResult;
use crate::records::RecordSet;
use crate::tree::{SiblingOrder, Tree, TreeNode};
use crate::window::sibling_window;

/// The chain-plus-window tree built around one target.
#[derive(Clone, Debug, PartialEq)]
pub struct PartialTree {
    pub target: ContentId,
    /// Root-to-target ids of the resolved chain.
    pub chain: Vec<ContentId>,
    /// Set when the chain stopped at a parent id with no record.
    pub broken_at: Option<ContentId>,
    pub tree: Tree<ContentId>,
}

impl PartialTree {
    /// Chapter and section descriptors taken from the chain's records.
    ///
    /// Chain records are matched by `content_type`; when no record is typed
    /// `section`, the target itself describes the section.
    pub fn metadata(&self) -> SectionMetadata {
        let mut meta = SectionMetadata::default();
        for id in &self.chain {
            let Some(record) = self.tree.get(id).and_then(|n| n.record.as_ref()) else {
                continue;
            };
            let slot = match record.content_type.to_ascii_lowercase().as_str() {
                "title" => &mut meta.title,
                "chapter" => &mut meta.chapter,
                "section" => &mut meta.section,
                _ => continue,
            };
            *slot = Some(describe(record));
        }
        if meta.section.is_none() {
            meta.section = self
                .tree
                .get(&self.target)
                .and_then(|n| n.record.as_ref())
                .map(describe);
        }
        meta
    }
}

fn describe(record: &ContentRecord) -> String {
    match &record.heading {
        Some(heading) => format!("{} {}", record.section_display, heading).trim().to_string(),
        None => record.section_display.trim().to_string(),
    }
}

/// Build the partial tree for `target` from a record snapshot.
pub fn build_partial_tree(records: &RecordSet, target: ContentId, config: &PartialTreeConfig) -> TreeResult<PartialTree> {
    let chain = resolve_chain(records, target, config.max_depth)?;

    let mut included: BTreeSet<ContentId> = BTreeSet::new();
    for node in &chain.nodes {
        let siblings = records.children_of(node.parent_id);
        included.extend(sibling_window(siblings, &node.id, config.window_radius, |id| *id));
        included.insert(node.id);
    }
    if config.include_target_subtree {
        included.extend(records.descendants(target));
    }

    let nodes: BTreeMap<ContentId, TreeNode<ContentId>> = included
        .into_iter()
        .filter_map(|id| records.get(id))
        .map(|r| (r.id, TreeNode::from_record(r.id, r.parent_id, r.clone())))
        .collect();

    let tree = Tree::link(SiblingOrder::OrderNumber, nodes);
    debug!(target = %target, chain = chain.len(), nodes = tree.len(), "built partial tree");

    Ok(PartialTree {
        target,
        chain: chain.ids(),
        broken_at: chain.broken_at,
        tree,
    })
}
