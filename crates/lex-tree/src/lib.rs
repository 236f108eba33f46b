//! Tree assembly for Statute Lens.
//!
//! Turns flat, relationally-addressed content records into nested trees.
//! Records point at their parent either by id or by a `/`-delimited ident
//! path; both shapes are assembled into the same arena-backed [`Tree`].
//!
//! # Key Types
//!
//! - [`RecordSet`] -- Immutable, id-indexed snapshot of fetched records
//! - [`AncestorChain`] / [`resolve_chain`] -- Root-to-target parent walk
//! - [`sibling_window`] -- Bounded slice of siblings around a target
//! - [`Tree`] / [`assemble`] -- Arena tree built by an [`AssemblyStrategy`]
//! - [`PartialTree`] / [`build_partial_tree`] -- Chain plus sibling windows for one target

pub mod assemble;
pub mod chain;
pub mod config;
pub mod error;
pub mod ident;
pub mod partial;
pub mod records;
pub mod tree;
pub mod window;

pub use assemble::{assemble, AssemblyStrategy, IdentPathStrategy, ParentIdStrategy};
pub use chain::{resolve_chain, AncestorChain, DEFAULT_MAX_DEPTH};
pub use config::PartialTreeConfig;
pub use error::{TreeError, TreeResult};
pub use ident::IdentPath;
pub use partial::{build_partial_tree, PartialTree};
pub use records::{RecordLookup, RecordSet};
pub use tree::{NodeKey, Orphan, SiblingOrder, Tree, TreeNode};
pub use window::{locate_window, sibling_window, DEFAULT_RADIUS};
