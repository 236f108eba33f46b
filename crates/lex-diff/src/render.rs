//! Node and tree rendering against amendment records.

use tracing::debug;

use lex_tree::{NodeKey, Tree};
use lex_types::{ContentRecord, DiffRecord, Field, FieldValue, Rendering, Span};

use crate::char_diff::diff_chars;
use crate::citation::CitationParser;
use crate::config::{DiffConfig, DiffMode};
use crate::error::DiffResult;
use crate::index::DiffIndex;
use crate::myers::diff_myers;
use crate::word_diff::diff_words;

/// Result of comparing one field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldOutcome {
    /// No candidate value, or the candidate matches the base.
    Unchanged,
    Diffed(Vec<Span>),
}

impl FieldOutcome {
    pub fn is_diffed(&self) -> bool {
        matches!(self, Self::Diffed(_))
    }
}

/// Diffs fields and renders nodes with the configured engine.
#[derive(Clone, Debug)]
pub struct FieldDiffer {
    config: DiffConfig,
    citations: CitationParser,
}

impl FieldDiffer {
    pub fn new(config: DiffConfig) -> DiffResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            citations: CitationParser::new()?,
        })
    }

    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Diff two raw strings with the configured mode.
    pub fn diff_text(&self, base: &str, candidate: &str) -> Vec<Span> {
        match self.config.mode {
            DiffMode::Character => diff_chars(base, candidate).spans(),
            DiffMode::Word => diff_words(base, candidate, self.config.merge_gap),
            DiffMode::Myers => diff_myers(base, candidate),
        }
    }

    /// Compare one field of a node against its amended value.
    ///
    /// Citation markup in `content_str` is stripped before comparing. A field
    /// whose markup cannot be parsed is reported as unchanged.
    pub fn diff_field(&self, field: Field, base: &str, candidate: Option<&str>) -> FieldOutcome {
        let Some(candidate) = candidate else {
            return FieldOutcome::Unchanged;
        };
        match self.try_diff_field(field, base, candidate) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(field = %field, error = %err, "field diff failed, rendering unchanged");
                FieldOutcome::Unchanged
            }
        }
    }

    fn try_diff_field(&self, field: Field, base: &str, candidate: &str) -> DiffResult<FieldOutcome> {
        let (base, candidate) = match field {
            Field::ContentStr => (self.citations.strip(base)?, self.citations.strip(candidate)?),
            _ => (base.to_string(), candidate.to_string()),
        };
        if base == candidate {
            return Ok(FieldOutcome::Unchanged);
        }
        Ok(FieldOutcome::Diffed(self.diff_text(&base, &candidate)))
    }

    /// Render every field of `record`, diffing against `diff` when given.
    ///
    /// A node with at least one diffed field is flagged and has its order
    /// nudged ahead of its undiffed siblings. Citation links are resolved only
    /// on undiffed nodes; an unchanged body of a diffed node renders as plain
    /// text with its markup stripped.
    pub fn render_node(&self, record: &ContentRecord, diff: Option<&DiffRecord>) -> Rendering {
        let candidate = |field: Field| diff.and_then(|d| d.field(field));

        let base_heading = record.heading.as_deref().unwrap_or_default();
        let section_display = self.diff_field(
            Field::SectionDisplay,
            &record.section_display,
            candidate(Field::SectionDisplay),
        );
        let heading = self.diff_field(Field::Heading, base_heading, candidate(Field::Heading));
        let content_str = self.diff_field(Field::ContentStr, &record.content_str, candidate(Field::ContentStr));

        let diffed = section_display.is_diffed() || heading.is_diffed() || content_str.is_diffed();

        let section_display = match section_display {
            FieldOutcome::Diffed(spans) => FieldValue::Diffed(spans),
            FieldOutcome::Unchanged => FieldValue::Plain(record.section_display.clone()),
        };
        let heading = match heading {
            FieldOutcome::Diffed(spans) => Some(FieldValue::Diffed(spans)),
            FieldOutcome::Unchanged => record.heading.clone().map(FieldValue::Plain),
        };
        let content_str = match content_str {
            FieldOutcome::Diffed(spans) => FieldValue::Diffed(spans),
            FieldOutcome::Unchanged if diffed => self.stripped_content(record),
            FieldOutcome::Unchanged => self.undiffed_content(record),
        };

        let order_number = if diffed {
            record.order_number - self.config.order_nudge
        } else {
            record.order_number
        };

        Rendering {
            section_display,
            heading,
            content_str,
            diffed,
            order_number,
        }
    }

    fn stripped_content(&self, record: &ContentRecord) -> FieldValue {
        let text = &record.content_str;
        if !CitationParser::has_markup(text) {
            return FieldValue::Plain(text.clone());
        }
        match self.citations.strip(text) {
            Ok(stripped) => FieldValue::Plain(stripped),
            Err(err) => {
                debug!(id = %record.id, error = %err, "citation markup left in place");
                FieldValue::Plain(text.clone())
            }
        }
    }

    fn undiffed_content(&self, record: &ContentRecord) -> FieldValue {
        let text = &record.content_str;
        if !self.config.resolve_citations || !CitationParser::has_markup(text) {
            return FieldValue::Plain(text.clone());
        }
        match self.citations.resolve(text) {
            Ok(spans) => FieldValue::Linked(spans),
            Err(err) => {
                debug!(id = %record.id, error = %err, "citation markup left unresolved");
                FieldValue::Plain(text.clone())
            }
        }
    }

    /// Render every record node of `tree` against `index`, re-sorting siblings.
    ///
    /// Placeholders keep no rendering.
    pub fn render_tree<K: NodeKey>(&self, tree: Tree<K>, index: &DiffIndex) -> Tree<K> {
        let mut diffed = 0usize;
        let tree = tree.map_rendering(|node| {
            let record = node.record.as_ref()?;
            let rendering = self.render_node(record, index.primary(record.id));
            diffed += usize::from(rendering.diffed);
            Some(rendering)
        });
        debug!(nodes = tree.len(), diffed, "rendered tree");
        tree
    }
}

#[cfg(test)]
mod tests {
    use lex_tree::{SiblingOrder, TreeNode};
    use lex_types::{ContentId, DiffId, SpanKind};

    use super::*;

    fn differ(mode: DiffMode) -> FieldDiffer {
        FieldDiffer::new(DiffConfig::default().with_mode(mode)).unwrap()
    }

    fn rec(id: u64, parent: Option<u64>, order: f64) -> ContentRecord {
        ContentRecord::new(ContentId::new(id), parent.map(ContentId::new)).with_order(order)
    }

    fn amend(id: u64, content: u64) -> DiffRecord {
        DiffRecord::new(DiffId::new(id), ContentId::new(content))
    }

    #[test]
    fn missing_or_equal_candidate_is_unchanged() {
        let d = differ(DiffMode::Character);
        assert_eq!(d.diff_field(Field::Heading, "Definitions", None), FieldOutcome::Unchanged);
        assert_eq!(
            d.diff_field(Field::Heading, "Definitions", Some("Definitions")),
            FieldOutcome::Unchanged
        );
    }

    #[test]
    fn character_mode_gives_four_spans() {
        let d = differ(DiffMode::Character);
        let FieldOutcome::Diffed(spans) = d.diff_field(
            Field::ContentStr,
            "Section 5 is amended",
            Some("Section 5 is hereby amended"),
        ) else {
            panic!("expected a diff");
        };
        assert_eq!(spans.len(), 4);
        assert_eq!(spans[2], Span::added("hereby "));
    }

    #[test]
    fn word_mode_uses_merge_gap() {
        let d = differ(DiffMode::Word);
        let FieldOutcome::Diffed(spans) = d.diff_field(Field::ContentStr, "a b c d e f", Some("a X c d Y f")) else {
            panic!("expected a diff");
        };
        assert_eq!(spans.iter().filter(|s| s.kind == SpanKind::Removed).count(), 1);
    }

    #[test]
    fn citations_are_stripped_before_diffing() {
        let d = differ(DiffMode::Character);
        let base = r#"see <ref href="/s/5">section 5</ref>"#;
        assert_eq!(d.diff_field(Field::ContentStr, base, Some("see section 5")), FieldOutcome::Unchanged);
        let FieldOutcome::Diffed(spans) = d.diff_field(Field::ContentStr, base, Some("see section 6")) else {
            panic!("expected a diff");
        };
        assert!(spans.iter().all(|s| !matches!(s.kind, SpanKind::Citation { .. })));
        assert_eq!(lex_types::base_text(&spans), "see section 5");
    }

    #[test]
    fn malformed_markup_degrades_to_unchanged() {
        let d = differ(DiffMode::Character);
        let outcome = d.diff_field(Field::ContentStr, "see <ref href=\"/a\">x", Some("changed"));
        assert_eq!(outcome, FieldOutcome::Unchanged);
    }

    #[test]
    fn render_node_nudges_diffed_order() {
        let d = differ(DiffMode::Character);
        let record = rec(5, Some(1), 3.0).with_content("old text");
        let rendering = d.render_node(&record, Some(&amend(1, 5).with_content("new text")));
        assert!(rendering.diffed);
        assert!(rendering.content_str.is_diffed());
        assert!((rendering.order_number - 2.99).abs() < 1e-9);
        assert_eq!(rendering.section_display, FieldValue::Plain(String::new()));
    }

    #[test]
    fn render_node_without_diff_is_plain() {
        let d = differ(DiffMode::Character);
        let record = rec(5, Some(1), 3.0).with_heading("Definitions").with_content("text");
        let rendering = d.render_node(&record, None);
        assert_eq!(rendering, Rendering::plain(&record));
    }

    #[test]
    fn added_heading_diffs_against_empty() {
        let d = differ(DiffMode::Character);
        let record = rec(5, Some(1), 3.0);
        let rendering = d.render_node(&record, Some(&amend(1, 5).with_heading("New heading")));
        let spans = rendering.heading.as_ref().and_then(FieldValue::spans).unwrap();
        assert_eq!(lex_types::candidate_text(spans), "New heading");
    }

    #[test]
    fn undiffed_citations_become_links() {
        let d = differ(DiffMode::Character);
        let record = rec(5, None, 1.0).with_content(r#"under <ref href="/s/501">section 501</ref>"#);
        let rendering = d.render_node(&record, None);
        let FieldValue::Linked(spans) = &rendering.content_str else {
            panic!("expected linked content");
        };
        assert_eq!(spans[1], Span::citation("/s/501", "section 501"));
    }

    #[test]
    fn diffed_node_never_links_citations() {
        let d = differ(DiffMode::Character);
        let record = rec(5, None, 1.0)
            .with_heading("Definitions")
            .with_content(r#"under <ref href="/s/501">section 501</ref>"#);
        let rendering = d.render_node(&record, Some(&amend(1, 5).with_heading("Terms")));
        assert!(rendering.diffed);
        assert!(rendering.heading.as_ref().is_some_and(FieldValue::is_diffed));
        assert_eq!(rendering.content_str, FieldValue::Plain("under section 501".into()));
    }

    #[test]
    fn diffed_node_keeps_malformed_body_raw() {
        let d = differ(DiffMode::Character);
        let record = rec(5, None, 1.0).with_section_display("§ 5").with_content("x </ref>");
        let rendering = d.render_node(&record, Some(&amend(1, 5).with_section_display("§ 6")));
        assert!(rendering.diffed);
        assert_eq!(rendering.content_str, FieldValue::Plain("x </ref>".into()));
    }

    #[test]
    fn invalid_nudge_is_rejected() {
        for nudge in [-1.0, f64::NAN] {
            let config = DiffConfig {
                order_nudge: nudge,
                ..Default::default()
            };
            assert!(matches!(FieldDiffer::new(config), Err(crate::DiffError::Config(_))));
        }
    }

    #[test]
    fn citation_resolution_can_be_disabled() {
        let config = DiffConfig {
            resolve_citations: false,
            ..Default::default()
        };
        let d = FieldDiffer::new(config).unwrap();
        let text = r#"under <ref href="/s/501">section 501</ref>"#;
        let rendering = d.render_node(&rec(5, None, 1.0).with_content(text), None);
        assert_eq!(rendering.content_str, FieldValue::Plain(text.to_string()));
    }

    #[test]
    fn malformed_undiffed_markup_stays_plain() {
        let d = differ(DiffMode::Character);
        let rendering = d.render_node(&rec(5, None, 1.0).with_content("x </ref>"), None);
        assert_eq!(rendering.content_str, FieldValue::Plain("x </ref>".into()));
    }

    #[test]
    fn render_tree_moves_diffed_node_ahead_of_equal_sibling() {
        // Siblings 2 and 3 share an order number; only 3 is amended.
        let nodes = [rec(1, None, 1.0), rec(2, Some(1), 1.0), rec(3, Some(1), 1.0)]
            .into_iter()
            .map(|r| (r.id, TreeNode::from_record(r.id, r.parent_id, r)))
            .collect();
        let tree = lex_tree::Tree::link(SiblingOrder::OrderNumber, nodes);
        assert_eq!(tree.children(&ContentId::new(1)), &[ContentId::new(2), ContentId::new(3)]);

        let index = DiffIndex::new(vec![amend(7, 3).with_content("amended")]);
        let rendered = differ(DiffMode::Character).render_tree(tree, &index);
        assert_eq!(rendered.children(&ContentId::new(1)), &[ContentId::new(3), ContentId::new(2)]);
        assert!(rendered.get(&ContentId::new(3)).unwrap().body().diffed);
        assert!(!rendered.get(&ContentId::new(2)).unwrap().body().diffed);
    }

    #[test]
    fn render_tree_uses_lowest_diff_id() {
        let nodes = [rec(1, None, 1.0).with_content("base")]
            .into_iter()
            .map(|r| (r.id, TreeNode::from_record(r.id, r.parent_id, r)))
            .collect();
        let tree = lex_tree::Tree::link(SiblingOrder::OrderNumber, nodes);
        let index = DiffIndex::new(vec![amend(9, 1).with_content("later"), amend(2, 1).with_content("first")]);
        let rendered = differ(DiffMode::Character).render_tree(tree, &index);
        let body = rendered.get(&ContentId::new(1)).unwrap().body();
        assert_eq!(body.content_str.display_text(), "first");
    }
}
