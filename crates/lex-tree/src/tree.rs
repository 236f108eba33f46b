//! Arena-backed content trees.
//!
//! A [`Tree`] owns every node in one key-ordered map. Parent/child links are
//! stored as keys, never as references, so the structure has a single owner
//! and no reference cycles. Nested [`ContentNode`] views are produced on
//! demand for the rendering layer.
//!
//! # Invariants
//!
//! - Every node's `parent`, when set, names a node in the same tree.
//! - `children` lists and `roots` are sorted by the tree's [`SiblingOrder`].
//! - Nodes without a record are placeholders synthesized for missing parents.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use tracing::warn;

use lex_types::{ContentId, ContentNode, ContentRecord, NodeBody, Rendering};

use crate::ident::IdentPath;

/// A key that identifies tree nodes.
pub trait NodeKey: Clone + Ord + fmt::Debug + Send + Sync + 'static {
    /// Parent of a placeholder synthesized for this key, if derivable.
    fn placeholder_parent(&self) -> Option<Self>;

    /// Content id carried by the key itself.
    fn content_id(&self) -> Option<ContentId>;

    /// Ident path carried by the key itself.
    fn ident(&self) -> Option<String>;
}

impl NodeKey for ContentId {
    fn placeholder_parent(&self) -> Option<Self> {
        None
    }

    fn content_id(&self) -> Option<ContentId> {
        Some(*self)
    }

    fn ident(&self) -> Option<String> {
        None
    }
}

impl NodeKey for IdentPath {
    fn placeholder_parent(&self) -> Option<Self> {
        self.parent()
    }

    fn content_id(&self) -> Option<ContentId> {
        None
    }

    fn ident(&self) -> Option<String> {
        Some(self.as_str().to_string())
    }
}

/// How siblings are ordered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SiblingOrder {
    /// By `order_number` (after any diff nudge), then key.
    OrderNumber,
    /// By key alone (ident-path order).
    Key,
}

/// One node of a [`Tree`].
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode<K> {
    pub key: K,
    pub parent: Option<K>,
    /// `None` for placeholders.
    pub record: Option<ContentRecord>,
    /// Field rendering from the diff layer, once computed.
    pub rendering: Option<Rendering>,
    pub children: Vec<K>,
}

impl<K: NodeKey> TreeNode<K> {
    /// A node backed by a real record.
    pub fn from_record(key: K, parent: Option<K>, record: ContentRecord) -> Self {
        Self {
            key,
            parent,
            record: Some(record),
            rendering: None,
            children: Vec::new(),
        }
    }

    /// A synthesized node standing in for a missing parent.
    pub fn placeholder(key: K) -> Self {
        let parent = key.placeholder_parent();
        Self {
            key,
            parent,
            record: None,
            rendering: None,
            children: Vec::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.record.is_none()
    }

    /// Content id of the node, from its record or its key.
    pub fn id(&self) -> Option<ContentId> {
        self.record.as_ref().map(|r| r.id).or_else(|| self.key.content_id())
    }

    /// Effective sibling position, including any diff nudge.
    pub fn order_number(&self) -> f64 {
        match (&self.rendering, &self.record) {
            (Some(rendering), _) => rendering.order_number,
            (None, Some(record)) => record.order_number,
            (None, None) => 0.0,
        }
    }

    /// The flat output fields of this node.
    pub fn body(&self) -> NodeBody {
        match &self.record {
            Some(record) => NodeBody::from_record(record, self.rendering.as_ref()),
            None => NodeBody::placeholder(self.key.content_id(), self.key.ident()),
        }
    }
}

/// A node that named a parent absent from its input set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Orphan<K> {
    pub node: K,
    pub missing_parent: K,
}

/// An assembled content tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Tree<K> {
    nodes: BTreeMap<K, TreeNode<K>>,
    roots: Vec<K>,
    order: SiblingOrder,
    orphans: Vec<Orphan<K>>,
}

impl<K: NodeKey> Tree<K> {
    /// Link indexed nodes into a tree.
    ///
    /// Any parent key that is not among `nodes` is materialized as a
    /// placeholder (recursively, while the key yields a parent of its own)
    /// and reported in [`Tree::orphans`].
    pub fn link(order: SiblingOrder, mut nodes: BTreeMap<K, TreeNode<K>>) -> Self {
        let mut orphans = Vec::new();

        let dangling: Vec<(K, K)> = nodes
            .values()
            .filter_map(|n| match &n.parent {
                Some(p) if !nodes.contains_key(p) => Some((n.key.clone(), p.clone())),
                _ => None,
            })
            .collect();
        for (node, missing) in dangling {
            if !nodes.contains_key(&missing) {
                warn!(node = ?node, parent = ?missing, "parent missing; synthesizing placeholder");
            }
            let mut next = Some(missing.clone());
            while let Some(key) = next {
                if nodes.contains_key(&key) {
                    break;
                }
                let placeholder = TreeNode::placeholder(key.clone());
                next = placeholder.parent.clone();
                nodes.insert(key, placeholder);
            }
            orphans.push(Orphan {
                node,
                missing_parent: missing,
            });
        }

        for node in nodes.values_mut() {
            node.children.clear();
        }
        let mut roots = Vec::new();
        let links: Vec<(K, Option<K>)> = nodes.values().map(|n| (n.key.clone(), n.parent.clone())).collect();
        for (key, parent) in links {
            match parent {
                Some(p) => {
                    if let Some(parent) = nodes.get_mut(&p) {
                        parent.children.push(key);
                    }
                }
                None => roots.push(key),
            }
        }

        let mut tree = Self {
            nodes,
            roots,
            order,
            orphans,
        };
        tree.sort_siblings();
        tree
    }

    /// Number of nodes, placeholders included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&TreeNode<K>> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn roots(&self) -> &[K] {
        &self.roots
    }

    /// Ordered children of `key`; empty for unknown keys.
    pub fn children(&self, key: &K) -> &[K] {
        self.nodes.get(key).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn order(&self) -> SiblingOrder {
        self.order
    }

    pub fn orphans(&self) -> &[Orphan<K>] {
        &self.orphans
    }

    /// All nodes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode<K>> {
        self.nodes.values()
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &TreeNode<K>> {
        self.nodes.values().filter(|n| n.is_placeholder())
    }

    /// Nodes reachable from the roots, in pre-order.
    pub fn walk(&self) -> Vec<&TreeNode<K>> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&K> = self.roots.iter().rev().collect();
        while let Some(key) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            if !seen.insert(key) {
                continue;
            }
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Keys from the root down to `key`, inclusive; empty for unknown keys.
    pub fn path_to(&self, key: &K) -> Vec<K> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(key);
        while let Some(node) = current {
            if path.len() > self.nodes.len() {
                break;
            }
            path.push(node.key.clone());
            current = node.parent.as_ref().and_then(|p| self.nodes.get(p));
        }
        path.reverse();
        path
    }

    /// Rebuild the tree with a new rendering for every node, re-sorting siblings.
    ///
    /// `render` returns `None` to leave a node's rendering untouched.
    pub fn map_rendering<F>(mut self, mut render: F) -> Self
    where
        F: FnMut(&TreeNode<K>) -> Option<Rendering>,
    {
        for node in self.nodes.values_mut() {
            if let Some(rendering) = render(node) {
                node.rendering = Some(rendering);
            }
        }
        self.sort_siblings();
        self
    }

    /// Consume the tree, yielding its nodes.
    pub fn into_nodes(self) -> BTreeMap<K, TreeNode<K>> {
        self.nodes
    }

    /// Nested view for the rendering layer.
    pub fn to_nested(&self) -> Vec<ContentNode> {
        let mut seen = BTreeSet::new();
        self.roots
            .iter()
            .filter_map(|k| self.nest(k, &mut seen))
            .collect()
    }

    fn nest<'a>(&'a self, key: &'a K, seen: &mut BTreeSet<&'a K>) -> Option<ContentNode> {
        let node = self.nodes.get(key)?;
        if !seen.insert(key) {
            return None;
        }
        let children = node.children.iter().filter_map(|c| self.nest(c, seen)).collect();
        Some(ContentNode {
            body: node.body(),
            children,
        })
    }

    fn compare(&self, a: &K, b: &K) -> Ordering {
        match self.order {
            SiblingOrder::Key => a.cmp(b),
            SiblingOrder::OrderNumber => {
                let oa = self.nodes.get(a).map(TreeNode::order_number).unwrap_or(0.0);
                let ob = self.nodes.get(b).map(TreeNode::order_number).unwrap_or(0.0);
                oa.total_cmp(&ob).then_with(|| a.cmp(b))
            }
        }
    }

    fn sort_siblings(&mut self) {
        let mut sorted: Vec<(K, Vec<K>)> = self
            .nodes
            .values()
            .filter(|n| n.children.len() > 1)
            .map(|n| {
                let mut children = n.children.clone();
                children.sort_by(|a, b| self.compare(a, b));
                (n.key.clone(), children)
            })
            .collect();
        let mut roots = self.roots.clone();
        roots.sort_by(|a, b| self.compare(a, b));

        for (key, children) in sorted.drain(..) {
            if let Some(node) = self.nodes.get_mut(&key) {
                node.children = children;
            }
        }
        self.roots = roots;
    }
}
