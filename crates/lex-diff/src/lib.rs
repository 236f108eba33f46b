//! Diff engine for Statute Lens.
//!
//! Compares one field of a current-law node against the amended value and
//! produces a styled span sequence for the renderer.
//!
//! # Key Types
//!
//! - [`CharDiff`] / [`diff_chars`] -- Character-anchored prefix/suffix diff, snapped to word boundaries
//! - [`diff_words`] -- Word-anchored diff that merges nearby edit windows
//! - [`diff_myers`] -- Word-level Myers diff (minimal edit script)
//! - [`CitationParser`] -- Strips or resolves cross-reference markup
//! - [`FieldDiffer`] / [`DiffIndex`] -- Renders nodes and whole trees against amendment records

pub mod char_diff;
pub mod citation;
pub mod config;
pub mod error;
pub mod index;
pub mod myers;
pub mod render;
pub mod word_diff;

pub use char_diff::{diff_chars, CharDiff};
pub use citation::{Citation, CitationParser};
pub use config::{DiffConfig, DiffMode};
pub use error::{DiffError, DiffResult};
pub use index::DiffIndex;
pub use myers::diff_myers;
pub use render::{FieldDiffer, FieldOutcome};
pub use word_diff::diff_words;
