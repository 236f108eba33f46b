//! Tree assembly from flat records.
//!
//! Two input shapes are supported through one [`AssemblyStrategy`] trait:
//! explicit parent ids ([`ParentIdStrategy`]) and `/`-delimited ident paths
//! ([`IdentPathStrategy`]). Assembly is two-pass: every record is indexed
//! first, then linked, so a child may precede its parent in the input.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use lex_types::{compare_order, ContentId, ContentRecord};

use crate::error::{TreeError, TreeResult};
use crate::ident::IdentPath;
use crate::tree::{NodeKey, SiblingOrder, Tree, TreeNode};

/// How records are keyed and linked to their parents.
pub trait AssemblyStrategy {
    type Key: NodeKey;

    /// The key identifying `record` in the assembled tree.
    fn key(&self, record: &ContentRecord) -> TreeResult<Self::Key>;

    /// The key of `record`'s parent, if it has one.
    fn parent_key(&self, record: &ContentRecord, key: &Self::Key) -> Option<Self::Key>;

    /// How siblings are ordered in the assembled tree.
    fn sibling_order(&self) -> SiblingOrder;
}

/// Links records through their explicit `parent_id`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ParentIdStrategy;

impl AssemblyStrategy for ParentIdStrategy {
    type Key = ContentId;

    fn key(&self, record: &ContentRecord) -> TreeResult<ContentId> {
        Ok(record.id)
    }

    fn parent_key(&self, record: &ContentRecord, _key: &ContentId) -> Option<ContentId> {
        record.parent_id
    }

    fn sibling_order(&self) -> SiblingOrder {
        SiblingOrder::OrderNumber
    }
}

/// Links records through their ident path prefixes.
///
/// Prefixes without a record of their own are materialized as placeholders
/// so the tree stays connected.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentPathStrategy;

impl AssemblyStrategy for IdentPathStrategy {
    type Key = IdentPath;

    fn key(&self, record: &ContentRecord) -> TreeResult<IdentPath> {
        let ident = record.ident.as_deref().ok_or(TreeError::MissingIdent(record.id))?;
        IdentPath::parse(ident)
    }

    fn parent_key(&self, _record: &ContentRecord, key: &IdentPath) -> Option<IdentPath> {
        key.parent()
    }

    fn sibling_order(&self) -> SiblingOrder {
        SiblingOrder::Key
    }
}

/// Assemble a full tree from flat records.
///
/// Records are sorted by a stable key before linking; if two records share a
/// key the later one in that order wins. Fails if a record cannot be keyed or
/// if parent links form a cycle that never reaches a root.
pub fn assemble<S>(strategy: &S, records: impl IntoIterator<Item = ContentRecord>) -> TreeResult<Tree<S::Key>>
where
    S: AssemblyStrategy,
{
    let mut keyed = records
        .into_iter()
        .map(|r| strategy.key(&r).map(|k| (k, r)))
        .collect::<TreeResult<Vec<_>>>()?;

    let order = strategy.sibling_order();
    keyed.sort_by(|(ka, ra), (kb, rb)| match order {
        SiblingOrder::OrderNumber => compare_order(ra, rb).then_with(|| ka.cmp(kb)),
        SiblingOrder::Key => ka.cmp(kb).then_with(|| compare_order(ra, rb)),
    });

    // Pass one: index every record.
    let mut nodes = BTreeMap::new();
    for (key, record) in keyed {
        let parent = strategy.parent_key(&record, &key);
        let node = TreeNode::from_record(key.clone(), parent, record);
        if let Some(previous) = nodes.insert(key, node) {
            warn!(key = ?previous.key, "duplicate record key; keeping the later one");
        }
    }
    let records = nodes.len();

    // Pass two: link children to parents.
    let tree = Tree::link(order, nodes);
    ensure_rooted(&tree)?;

    debug!(
        records,
        nodes = tree.len(),
        roots = tree.roots().len(),
        placeholders = tree.len() - records,
        "assembled tree"
    );
    Ok(tree)
}

fn ensure_rooted<K: NodeKey>(tree: &Tree<K>) -> TreeResult<()> {
    let reachable = tree.walk();
    if reachable.len() == tree.len() {
        return Ok(());
    }
    let seen: BTreeSet<&K> = reachable.iter().map(|n| &n.key).collect();
    let stray = tree
        .iter()
        .find(|n| !seen.contains(&n.key))
        .map(|n| format!("{:?}", n.key))
        .unwrap_or_default();
    Err(TreeError::UnrootedCycle { key: stray })
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use proptest::prelude::*;

    use super::*;

    fn rec(id: u64, parent: Option<u64>, order: f64) -> ContentRecord {
        ContentRecord::new(ContentId::new(id), parent.map(ContentId::new)).with_order(order)
    }

    fn ident(id: u64, path: &str) -> ContentRecord {
        ContentRecord::new(ContentId::new(id), None).with_ident(path)
    }

    fn ids(raw: &[u64]) -> Vec<ContentId> {
        raw.iter().copied().map(ContentId::new).collect()
    }

    fn path(s: &str) -> IdentPath {
        IdentPath::parse(s).unwrap()
    }

    #[test]
    fn parent_id_mode_links_children_in_order() {
        let tree = assemble(
            &ParentIdStrategy,
            vec![
                rec(3, Some(1), 2.0),
                rec(2, Some(1), 1.0),
                rec(1, None, 1.0),
                rec(4, Some(2), 1.0),
            ],
        )
        .unwrap();
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.roots(), ids(&[1]).as_slice());
        assert_eq!(tree.children(&ContentId::new(1)), ids(&[2, 3]).as_slice());
        assert_eq!(tree.children(&ContentId::new(2)), ids(&[4]).as_slice());
    }

    #[test]
    fn child_before_parent_in_input() {
        let tree = assemble(&ParentIdStrategy, vec![rec(2, Some(1), 1.0), rec(1, None, 1.0)]).unwrap();
        assert_eq!(tree.roots(), ids(&[1]).as_slice());
        assert!(tree.placeholders().next().is_none());
    }

    #[test]
    fn parent_id_orphan_gets_placeholder() {
        let tree = assemble(&ParentIdStrategy, vec![rec(2, Some(1), 1.0)]).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.roots(), ids(&[1]).as_slice());
        assert_eq!(tree.orphans().len(), 1);
        let nested = tree.to_nested();
        assert!(nested[0].body.placeholder);
        assert_eq!(nested[0].children[0].body.id, Some(ContentId::new(2)));
    }

    #[test]
    fn multiple_roots_sorted_by_order() {
        let tree = assemble(&ParentIdStrategy, vec![rec(9, None, 2.0), rec(8, None, 1.0)]).unwrap();
        assert_eq!(tree.roots(), ids(&[8, 9]).as_slice());
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let err = assemble(&ParentIdStrategy, vec![rec(1, Some(2), 1.0), rec(2, Some(1), 1.0)]).unwrap_err();
        assert!(matches!(err, TreeError::UnrootedCycle { .. }));
    }

    #[test]
    fn ident_mode_synthesizes_prefixes() {
        let tree = assemble(
            &IdentPathStrategy,
            vec![
                ident(10, "/us/usc/t26/s10"),
                ident(2, "/us/usc/t26/s2"),
                ident(21, "/us/usc/t26/s2/a"),
            ],
        )
        .unwrap();
        // us, usc, t26 are placeholders
        assert_eq!(tree.len(), 6);
        assert_eq!(tree.placeholders().count(), 3);
        assert_eq!(tree.roots(), &[path("/us")]);
        assert_eq!(
            tree.children(&path("/us/usc/t26")),
            &[path("/us/usc/t26/s2"), path("/us/usc/t26/s10")]
        );
        assert_eq!(tree.children(&path("/us/usc/t26/s2")), &[path("/us/usc/t26/s2/a")]);
    }

    #[test]
    fn ident_mode_uses_existing_parent_records() {
        let tree = assemble(&IdentPathStrategy, vec![ident(2, "/t1/s1"), ident(1, "/t1")]).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.placeholders().next().is_none());
        assert!(tree.orphans().is_empty());
    }

    #[test]
    fn ident_mode_requires_idents() {
        let err = assemble(&IdentPathStrategy, vec![rec(1, None, 1.0)]).unwrap_err();
        assert_eq!(err, TreeError::MissingIdent(ContentId::new(1)));
    }

    #[test]
    fn ident_mode_rejects_malformed_paths() {
        let err = assemble(&IdentPathStrategy, vec![ident(1, "/t1//s1")]).unwrap_err();
        assert!(matches!(err, TreeError::InvalidIdent { .. }));
    }

    #[test]
    fn nested_output_preserves_numbering_order() {
        let tree = assemble(
            &IdentPathStrategy,
            vec![ident(3, "/t1/s3"), ident(1, "/t1/s1"), ident(2, "/t1/s2")],
        )
        .unwrap();
        let nested = tree.to_nested();
        let order: Vec<_> = nested[0].children.iter().map(|c| c.body.id.unwrap().get()).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    fn resolvable_records() -> impl Strategy<Value = Vec<ContentRecord>> {
        // Record i (1-based) may only point at a parent with a smaller id,
        // so every link resolves and no cycle forms.
        prop::collection::vec((any::<prop::sample::Index>(), 0u32..100, any::<bool>()), 1..40).prop_map(|specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (pick, order, is_root))| {
                    let id = i as u64 + 1;
                    let parent = if i == 0 || is_root {
                        None
                    } else {
                        Some(pick.index(i) as u64 + 1)
                    };
                    rec(id, parent, f64::from(order))
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn assembled_tree_keeps_every_record(records in resolvable_records()) {
            let n = records.len();
            let mut reversed = records.clone();
            reversed.reverse();

            let tree = assemble(&ParentIdStrategy, records).unwrap();
            prop_assert_eq!(tree.len(), n);
            prop_assert_eq!(tree.walk().len(), n);
            let nested_total: usize = tree.to_nested().iter().map(|r| r.count()).sum();
            prop_assert_eq!(nested_total, n);

            for node in tree.iter() {
                let children = tree.children(&node.key);
                for pair in children.windows(2) {
                    let a = tree.get(&pair[0]).unwrap().record.as_ref().unwrap();
                    let b = tree.get(&pair[1]).unwrap().record.as_ref().unwrap();
                    prop_assert_ne!(compare_order(a, b), Ordering::Greater);
                }
            }

            // Input order does not matter.
            let again = assemble(&ParentIdStrategy, reversed).unwrap();
            prop_assert_eq!(tree.to_nested(), again.to_nested());
        }
    }
}
