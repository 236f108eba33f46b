//! Ancestor chain resolution.
//!
//! Walks parent pointers from a target up to a root and returns the chain in
//! root-to-target order. The walk is bounded: a revisited id or a walk longer
//! than the configured depth is reported as [`TreeError::CycleDetected`]
//! instead of looping forever on malformed data.

use std::collections::HashSet;

use tracing::{debug, warn};

use lex_types::{ContentId, ContentRecord};

use crate::error::{TreeError, TreeResult};
use crate::records::RecordLookup;

/// Default bound on parent hops. Real hierarchies are far shallower.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The records from a root down to a target, inclusive.
#[derive(Clone, Debug, PartialEq)]
pub struct AncestorChain<'a> {
    /// Root first, target last. Never empty.
    pub nodes: Vec<&'a ContentRecord>,
    /// A declared parent id that had no record. The chain stops below it.
    pub broken_at: Option<ContentId>,
}

impl<'a> AncestorChain<'a> {
    pub fn root(&self) -> &'a ContentRecord {
        self.nodes[0]
    }

    pub fn target(&self) -> &'a ContentRecord {
        self.nodes[self.nodes.len() - 1]
    }

    /// Ids in root-to-target order.
    pub fn ids(&self) -> Vec<ContentId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if the walk reached a record with no parent.
    pub fn is_complete(&self) -> bool {
        self.broken_at.is_none()
    }
}

/// Resolve the ancestor chain of `target`.
///
/// Fails with [`TreeError::NotFound`] if `target` has no record and with
/// [`TreeError::CycleDetected`] if the walk revisits a node or takes more
/// than `max_depth` hops.
pub fn resolve_chain<L>(lookup: &L, target: ContentId, max_depth: usize) -> TreeResult<AncestorChain<'_>>
where
    L: RecordLookup + ?Sized,
{
    let start = lookup.record(target).ok_or(TreeError::NotFound(target))?;

    let mut nodes = vec![start];
    let mut seen = HashSet::from([target]);
    let mut broken_at = None;
    let mut current = start;

    while let Some(parent_id) = current.parent_id {
        let hops = nodes.len();
        if hops > max_depth || !seen.insert(parent_id) {
            return Err(TreeError::CycleDetected {
                start: target,
                depth: hops,
            });
        }
        match lookup.record(parent_id) {
            Some(parent) => {
                nodes.push(parent);
                current = parent;
            }
            None => {
                warn!(target = %target, missing = %parent_id, "ancestor chain broken by missing parent");
                broken_at = Some(parent_id);
                break;
            }
        }
    }

    nodes.reverse();
    debug!(target = %target, depth = nodes.len(), "resolved ancestor chain");
    Ok(AncestorChain { nodes, broken_at })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::records::RecordSet;

    fn rec(id: u64, parent: Option<u64>) -> ContentRecord {
        ContentRecord::new(ContentId::new(id), parent.map(ContentId::new))
    }

    fn ids(raw: &[u64]) -> Vec<ContentId> {
        raw.iter().copied().map(ContentId::new).collect()
    }

    #[test]
    fn chain_is_root_first() {
        let set = RecordSet::new(vec![rec(1, None), rec(2, Some(1)), rec(3, Some(2))]);
        let chain = resolve_chain(&set, ContentId::new(3), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(chain.ids(), ids(&[1, 2, 3]));
        assert_eq!(chain.root().id, ContentId::new(1));
        assert_eq!(chain.target().id, ContentId::new(3));
        assert!(chain.is_complete());
    }

    #[test]
    fn root_target_is_single_node_chain() {
        let set = RecordSet::new(vec![rec(1, None)]);
        let chain = resolve_chain(&set, ContentId::new(1), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(chain.ids(), ids(&[1]));
    }

    #[test]
    fn missing_target_is_not_found() {
        let set = RecordSet::new(vec![rec(1, None)]);
        let err = resolve_chain(&set, ContentId::new(7), DEFAULT_MAX_DEPTH).unwrap_err();
        assert_eq!(err, TreeError::NotFound(ContentId::new(7)));
    }

    #[test]
    fn parent_cycle_is_detected() {
        let set = RecordSet::new(vec![rec(1, Some(3)), rec(2, Some(1)), rec(3, Some(2))]);
        let err = resolve_chain(&set, ContentId::new(3), DEFAULT_MAX_DEPTH).unwrap_err();
        assert!(matches!(err, TreeError::CycleDetected { start, .. } if start == ContentId::new(3)));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let set = RecordSet::new(vec![rec(1, Some(1))]);
        assert!(matches!(
            resolve_chain(&set, ContentId::new(1), DEFAULT_MAX_DEPTH),
            Err(TreeError::CycleDetected { .. })
        ));
    }

    #[test]
    fn depth_bound_is_enforced() {
        let records: Vec<_> = (1..=10)
            .map(|i| rec(i, if i == 1 { None } else { Some(i - 1) }))
            .collect();
        let set = RecordSet::new(records);
        assert!(resolve_chain(&set, ContentId::new(10), 9).is_ok());
        let err = resolve_chain(&set, ContentId::new(10), 8).unwrap_err();
        assert_eq!(
            err,
            TreeError::CycleDetected {
                start: ContentId::new(10),
                depth: 9
            }
        );
    }

    #[test]
    fn missing_parent_breaks_chain_without_error() {
        let set = RecordSet::new(vec![rec(2, Some(1)), rec(3, Some(2))]);
        let chain = resolve_chain(&set, ContentId::new(3), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(chain.ids(), ids(&[2, 3]));
        assert_eq!(chain.broken_at, Some(ContentId::new(1)));
        assert!(!chain.is_complete());
    }

    #[test]
    fn works_over_plain_hash_map() {
        let map: HashMap<_, _> = [rec(1, None), rec(2, Some(1))]
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        let chain = resolve_chain(&map, ContentId::new(2), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(chain.ids(), ids(&[1, 2]));
    }
}
