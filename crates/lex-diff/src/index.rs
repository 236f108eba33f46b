use std::collections::BTreeMap;

use lex_types::{ContentId, DiffRecord};

/// Amendment records grouped by the node they target.
///
/// Several records may target one node; they are kept in [`lex_types::DiffId`]
/// order and rendering uses the first.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffIndex {
    by_content: BTreeMap<ContentId, Vec<DiffRecord>>,
}

impl DiffIndex {
    pub fn new(records: impl IntoIterator<Item = DiffRecord>) -> Self {
        let mut by_content: BTreeMap<ContentId, Vec<DiffRecord>> = BTreeMap::new();
        for record in records {
            by_content.entry(record.content_id).or_default().push(record);
        }
        for group in by_content.values_mut() {
            group.sort_by_key(|r| r.id);
        }
        Self { by_content }
    }

    /// Every record targeting `id`, lowest diff id first.
    pub fn get(&self, id: ContentId) -> &[DiffRecord] {
        self.by_content.get(&id).map_or(&[], Vec::as_slice)
    }

    /// The record used to render `id`.
    pub fn primary(&self, id: ContentId) -> Option<&DiffRecord> {
        self.get(id).first()
    }

    /// Number of targeted nodes.
    pub fn len(&self) -> usize {
        self.by_content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_content.is_empty()
    }

    /// Targeted content ids, ascending.
    pub fn ids(&self) -> impl Iterator<Item = ContentId> + '_ {
        self.by_content.keys().copied()
    }

    /// All records, grouped by content id.
    pub fn records(&self) -> impl Iterator<Item = &DiffRecord> {
        self.by_content.values().flatten()
    }
}

impl FromIterator<DiffRecord> for DiffIndex {
    fn from_iter<I: IntoIterator<Item = DiffRecord>>(iter: I) -> Self {
        Self::new(iter)
    }
}
