//! The flat record snapshot.
//!
//! [`RecordSet`] owns one fetched batch of [`ContentRecord`]s, indexed by id
//! and by parent. It is immutable once built, so many chain resolutions can
//! read it concurrently behind an `Arc`.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::warn;

use lex_types::{compare_order, ContentId, ContentRecord};

/// Lookup-by-id capability over a set of records.
pub trait RecordLookup {
    /// The record with the given id, if present.
    fn record(&self, id: ContentId) -> Option<&ContentRecord>;
}

impl RecordLookup for HashMap<ContentId, ContentRecord> {
    fn record(&self, id: ContentId) -> Option<&ContentRecord> {
        self.get(&id)
    }
}

impl RecordLookup for BTreeMap<ContentId, ContentRecord> {
    fn record(&self, id: ContentId) -> Option<&ContentRecord> {
        self.get(&id)
    }
}

/// An immutable, indexed snapshot of flat content records.
#[derive(Clone, Debug, Default)]
pub struct RecordSet {
    records: BTreeMap<ContentId, ContentRecord>,
    /// Parent id (`None` = top level) -> children in sibling order.
    children: BTreeMap<Option<ContentId>, Vec<ContentId>>,
}

impl RecordSet {
    /// Index a batch of records.
    ///
    /// When two records share an id the later one wins.
    pub fn new(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let mut by_id = BTreeMap::new();
        for record in records {
            let id = record.id;
            if by_id.insert(id, record).is_some() {
                warn!(id = %id, "duplicate content record; keeping the later one");
            }
        }

        let mut children: BTreeMap<Option<ContentId>, Vec<ContentId>> = BTreeMap::new();
        for record in by_id.values() {
            children.entry(record.parent_id).or_default().push(record.id);
        }
        for ids in children.values_mut() {
            ids.sort_by(|a, b| compare_order(&by_id[a], &by_id[b]));
        }

        Self {
            records: by_id,
            children,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the snapshot holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: ContentId) -> Option<&ContentRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: ContentId) -> bool {
        self.records.contains_key(&id)
    }

    /// All records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentRecord> {
        self.records.values()
    }

    /// Ordered children of `parent`; `None` lists the top level.
    pub fn children_of(&self, parent: Option<ContentId>) -> &[ContentId] {
        self.children.get(&parent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ordered siblings of `id`, including `id` itself.
    pub fn siblings_of(&self, id: ContentId) -> &[ContentId] {
        match self.records.get(&id) {
            Some(record) => self.children_of(record.parent_id),
            None => &[],
        }
    }

    /// Every descendant of `id` in pre-order, excluding `id`.
    ///
    /// Each node is visited once, so malformed cyclic data terminates.
    pub fn descendants(&self, id: ContentId) -> Vec<ContentId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<ContentId> = self.children_of(Some(id)).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children_of(Some(current)).iter().rev().copied());
        }
        out
    }

    /// Consume the snapshot, returning its records in id order.
    pub fn into_records(self) -> Vec<ContentRecord> {
        self.records.into_values().collect()
    }
}

impl RecordLookup for RecordSet {
    fn record(&self, id: ContentId) -> Option<&ContentRecord> {
        self.records.get(&id)
    }
}

impl FromIterator<ContentRecord> for RecordSet {
    fn from_iter<I: IntoIterator<Item = ContentRecord>>(iter: I) -> Self {
        Self::new(iter)
    }
}
