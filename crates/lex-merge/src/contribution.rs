use lex_diff::{DiffIndex, FieldDiffer};
use lex_tree::{build_partial_tree, PartialTree, PartialTreeConfig, RecordSet, Tree, TreeResult};
use lex_types::{ContentId, DiffId, DiffRecord, SectionMetadata};

/// One amendment's rendered partial tree, ready to be merged.
#[derive(Clone, Debug, PartialEq)]
pub struct Contribution {
    pub diff_id: DiffId,
    /// The node the amendment is anchored at.
    pub target: ContentId,
    pub tree: Tree<ContentId>,
    /// Descriptors attached to the target once merged.
    pub metadata: Option<SectionMetadata>,
}

impl Contribution {
    /// Wrap an already-rendered partial tree.
    pub fn from_partial(diff_id: DiffId, partial: PartialTree) -> Self {
        let metadata = Some(partial.metadata()).filter(|m| !m.is_empty());
        Self {
            diff_id,
            target: partial.target,
            tree: partial.tree,
            metadata,
        }
    }

    /// Build and render the partial tree for one amendment.
    ///
    /// Only `diff` itself is rendered; other amendments touching nodes of this
    /// tree are rendered by their own contributions.
    pub fn build(
        snapshot: &RecordSet,
        diff: &DiffRecord,
        partial: &PartialTreeConfig,
        differ: &FieldDiffer,
    ) -> TreeResult<Self> {
        let mut built = build_partial_tree(snapshot, diff.content_id, partial)?;
        let index = DiffIndex::new([diff.clone()]);
        built.tree = differ.render_tree(built.tree, &index);
        Ok(Self::from_partial(diff.id, built))
    }

    /// Root-to-target keys of this contribution.
    pub fn path(&self) -> Vec<ContentId> {
        self.tree.path_to(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use lex_diff::DiffConfig;
    use lex_tree::TreeError;
    use lex_types::ContentRecord;

    use super::*;

    fn snapshot() -> RecordSet {
        RecordSet::new(vec![
            ContentRecord::new(ContentId::new(1), None)
                .with_content_type("chapter")
                .with_section_display("Chapter 1"),
            ContentRecord::new(ContentId::new(11), Some(ContentId::new(1)))
                .with_content_type("section")
                .with_section_display("§ 11")
                .with_content("old"),
            ContentRecord::new(ContentId::new(12), Some(ContentId::new(1))).with_content("sibling"),
        ])
    }

    fn differ() -> FieldDiffer {
        FieldDiffer::new(DiffConfig::default()).unwrap()
    }

    #[test]
    fn build_renders_only_the_target() {
        let diff = DiffRecord::new(DiffId::new(3), ContentId::new(11)).with_content("new");
        let c = Contribution::build(&snapshot(), &diff, &PartialTreeConfig::default(), &differ()).unwrap();
        assert_eq!(c.diff_id, DiffId::new(3));
        assert_eq!(c.path(), vec![ContentId::new(1), ContentId::new(11)]);
        assert!(c.tree.get(&ContentId::new(11)).unwrap().body().diffed);
        assert!(!c.tree.get(&ContentId::new(12)).unwrap().body().diffed);
        let meta = c.metadata.unwrap();
        assert_eq!(meta.chapter.as_deref(), Some("Chapter 1"));
        assert_eq!(meta.section.as_deref(), Some("§ 11"));
    }

    #[test]
    fn build_surfaces_missing_target() {
        let diff = DiffRecord::new(DiffId::new(3), ContentId::new(99));
        let err = Contribution::build(&snapshot(), &diff, &PartialTreeConfig::default(), &differ()).unwrap_err();
        assert_eq!(err, TreeError::NotFound(ContentId::new(99)));
    }
}
