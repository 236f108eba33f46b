//! Identity-deduplicated merge of partial trees.
//!
//! Every content node appears once in a [`MergedForest`], however many
//! contributions include it. Merging is an owned fold: contributions are
//! absorbed one at a time, and whole forests combine node by node, so shards
//! can be folded independently and reduced at the end.
//!
//! # Invariants
//!
//! - `absorb`/`combine` are idempotent and commutative: the resulting node
//!   set, flags, `diff_ids` and children are independent of input order.
//! - Only a contribution's target receives its diff id and metadata.
//! - A rendering produced for a target beats one that was not; among equals
//!   the lowest originating diff id wins.

use std::cmp::Ordering;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::{debug, warn};

use lex_tree::Orphan;
use lex_types::{ContentId, ContentRecord, DiffId, MergedContentNode, NodeBody, Rendering, SectionMetadata};

use crate::contribution::Contribution;

/// Where a node's rendering came from, ranked for conflict resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RenderSource {
    for_target: bool,
    diff_id: DiffId,
}

impl RenderSource {
    /// Smaller is preferred.
    fn rank(&self) -> (bool, DiffId) {
        (!self.for_target, self.diff_id)
    }
}

/// One node of the merged identity map.
#[derive(Clone, Debug, PartialEq)]
pub struct MergedNode {
    pub id: ContentId,
    /// `None` while only placeholders for this id have been seen.
    pub record: Option<ContentRecord>,
    pub rendering: Option<Rendering>,
    rendered_by: Option<RenderSource>,
    pub is_target: bool,
    pub is_on_path: bool,
    pub diff_ids: BTreeSet<DiffId>,
    pub metadata: Option<SectionMetadata>,
    pub children: BTreeSet<ContentId>,
}

impl MergedNode {
    pub fn parent(&self) -> Option<ContentId> {
        self.record.as_ref().and_then(|r| r.parent_id)
    }

    pub fn is_placeholder(&self) -> bool {
        self.record.is_none()
    }

    /// The diff id whose contribution supplied the rendering.
    pub fn rendered_by(&self) -> Option<DiffId> {
        self.rendered_by.map(|s| s.diff_id)
    }

    /// Effective sibling position, including any diff nudge.
    pub fn order_number(&self) -> f64 {
        match (&self.rendering, &self.record) {
            (Some(rendering), _) => rendering.order_number,
            (None, Some(record)) => record.order_number,
            (None, None) => 0.0,
        }
    }

    fn body(&self) -> NodeBody {
        match &self.record {
            Some(record) => NodeBody::from_record(record, self.rendering.as_ref()),
            None => NodeBody::placeholder(Some(self.id), None),
        }
    }

    fn merge(&mut self, other: MergedNode) {
        if self.record.is_none() {
            self.record = other.record;
        }
        let incoming_wins = match (self.rendered_by, other.rendered_by) {
            (None, Some(_)) => true,
            (Some(current), Some(incoming)) => incoming.rank() < current.rank(),
            _ => false,
        };
        if incoming_wins {
            self.rendering = other.rendering;
            self.rendered_by = other.rendered_by;
        }
        self.is_target |= other.is_target;
        self.is_on_path |= other.is_on_path;
        self.diff_ids.extend(other.diff_ids);
        self.metadata = match (self.metadata.take(), other.metadata) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.children.extend(other.children);
    }
}

/// Nested merged output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Forest {
    pub roots: Vec<MergedContentNode>,
    /// Nodes whose parent is absent from the merge; each such parent is a
    /// placeholder root in `roots`.
    pub orphans: Vec<Orphan<ContentId>>,
}

impl Forest {
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes, placeholders included.
    pub fn count(&self) -> usize {
        self.roots.iter().map(MergedContentNode::count).sum()
    }

    pub fn find(&self, id: ContentId) -> Option<&MergedContentNode> {
        self.roots.iter().find_map(|r| r.find(id))
    }
}

/// The identity map contributions are folded into.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergedForest {
    nodes: BTreeMap<ContentId, MergedNode>,
}

impl MergedForest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ContentId) -> Option<&MergedNode> {
        self.nodes.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MergedNode> {
        self.nodes.values()
    }

    /// Fold one contribution into the map.
    pub fn absorb(&mut self, contribution: Contribution) {
        let on_path: BTreeSet<ContentId> = contribution.path().into_iter().collect();
        let Contribution {
            diff_id,
            target,
            tree,
            metadata,
        } = contribution;

        let mut metadata = metadata;
        for (id, node) in tree.into_nodes() {
            let is_target = id == target;
            let incoming = MergedNode {
                id,
                rendered_by: node.rendering.as_ref().map(|_| RenderSource {
                    for_target: is_target,
                    diff_id,
                }),
                record: node.record,
                rendering: node.rendering,
                is_target,
                is_on_path: on_path.contains(&id),
                diff_ids: if is_target { BTreeSet::from([diff_id]) } else { BTreeSet::new() },
                metadata: if is_target { metadata.take() } else { None },
                children: node.children.into_iter().collect(),
            };
            self.insert(incoming);
        }
        debug!(diff = %diff_id, target = %target, nodes = self.nodes.len(), "absorbed contribution");
    }

    /// Reduce another forest into this one.
    pub fn combine(&mut self, other: MergedForest) {
        for node in other.nodes.into_values() {
            self.insert(node);
        }
    }

    fn insert(&mut self, node: MergedNode) {
        match self.nodes.entry(node.id) {
            Entry::Vacant(slot) => {
                slot.insert(node);
            }
            Entry::Occupied(mut slot) => slot.get_mut().merge(node),
        }
    }

    /// Ids of every node whose parent is `None` or absent, in sibling order.
    pub fn roots(&self) -> Vec<ContentId> {
        let mut roots: Vec<ContentId> = self
            .nodes
            .values()
            .filter(|n| n.parent().map_or(true, |p| !self.nodes.contains_key(&p)))
            .map(|n| n.id)
            .collect();
        roots.sort_by(|a, b| self.compare(*a, *b));
        roots
    }

    /// Children of `id` in sibling order.
    pub fn children(&self, id: ContentId) -> Vec<ContentId> {
        let mut children: Vec<ContentId> = self
            .nodes
            .get(&id)
            .map(|n| n.children.iter().copied().filter(|c| self.nodes.contains_key(c)).collect())
            .unwrap_or_default();
        children.sort_by(|a, b| self.compare(*a, *b));
        children
    }

    fn compare(&self, a: ContentId, b: ContentId) -> Ordering {
        let order = |id: ContentId| self.nodes.get(&id).map_or(0.0, MergedNode::order_number);
        order(a).total_cmp(&order(b)).then_with(|| a.cmp(&b))
    }

    /// Nested view of the merged forest.
    ///
    /// A node whose parent id is absent gets a placeholder root for that
    /// parent instead of being dropped.
    pub fn forest(&self) -> Forest {
        let mut orphans = Vec::new();
        let mut adopted: BTreeMap<ContentId, Vec<ContentId>> = BTreeMap::new();
        let mut top: Vec<ContentId> = Vec::new();

        for id in self.roots() {
            match self.nodes.get(&id).and_then(MergedNode::parent) {
                Some(missing) => {
                    warn!(node = %id, parent = %missing, "parent missing from merge; synthesizing placeholder");
                    orphans.push(Orphan {
                        node: id,
                        missing_parent: missing,
                    });
                    adopted.entry(missing).or_default().push(id);
                }
                None => top.push(id),
            }
        }

        let mut seen = BTreeSet::new();
        let mut roots: Vec<(f64, ContentId, MergedContentNode)> = top
            .into_iter()
            .filter_map(|id| {
                let node = self.nest(id, &mut seen)?;
                Some((node.body.order_number, id, node))
            })
            .collect();
        for (parent, children) in adopted {
            let children: Vec<MergedContentNode> =
                children.into_iter().filter_map(|c| self.nest(c, &mut seen)).collect();
            let placeholder = MergedContentNode {
                body: NodeBody::placeholder(Some(parent), None),
                is_target: false,
                is_on_path: children.iter().any(|c| c.is_on_path),
                diff_ids: Vec::new(),
                metadata: None,
                children,
            };
            roots.push((placeholder.body.order_number, parent, placeholder));
        }
        roots.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        Forest {
            roots: roots.into_iter().map(|(_, _, node)| node).collect(),
            orphans,
        }
    }

    fn nest(&self, id: ContentId, seen: &mut BTreeSet<ContentId>) -> Option<MergedContentNode> {
        let node = self.nodes.get(&id)?;
        if !seen.insert(id) {
            return None;
        }
        let children = self
            .children(id)
            .into_iter()
            .filter_map(|c| self.nest(c, seen))
            .collect();
        Some(MergedContentNode {
            body: node.body(),
            is_target: node.is_target,
            is_on_path: node.is_on_path,
            diff_ids: node.diff_ids.iter().copied().collect(),
            metadata: node.metadata.clone(),
            children,
        })
    }
}

impl FromIterator<Contribution> for MergedForest {
    fn from_iter<I: IntoIterator<Item = Contribution>>(iter: I) -> Self {
        let mut forest = Self::new();
        for contribution in iter {
            forest.absorb(contribution);
        }
        forest
    }
}

/// Fold `contributions` into a fresh forest.
pub fn merge(contributions: impl IntoIterator<Item = Contribution>) -> MergedForest {
    contributions.into_iter().collect()
}

/// Fold `contributions` into an existing forest.
pub fn merge_into(mut forest: MergedForest, contributions: impl IntoIterator<Item = Contribution>) -> MergedForest {
    for contribution in contributions {
        forest.absorb(contribution);
    }
    forest
}
