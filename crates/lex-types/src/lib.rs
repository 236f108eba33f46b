//! Foundation types for Statute Lens.
//!
//! This crate provides the record, identity and output types shared by the
//! tree assembler, the diff computer and the multi-tree merger. Every other
//! `lex-*` crate depends on `lex-types`.
//!
//! # Key Types
//!
//! - [`ContentId`] / [`DiffId`] -- Stable integer identities for content nodes and amendments
//! - [`ContentRecord`] -- One flat, relationally-addressed record of statutory text
//! - [`DiffRecord`] -- Field overrides representing an amended node
//! - [`Span`] / [`FieldValue`] -- Styled field values handed to renderers
//! - [`ContentNode`] / [`MergedContentNode`] -- Nested, JSON-serializable output trees

pub mod error;
pub mod id;
pub mod node;
pub mod record;
pub mod span;

pub use error::TypeError;
pub use id::{ContentId, DiffId};
pub use node::{ContentNode, MergedContentNode, NodeBody, Rendering, SectionMetadata};
pub use record::{compare_order, ContentRecord, DiffRecord, Field};
pub use span::{base_text, candidate_text, FieldValue, Span, SpanKind};
