//! Multi-diff merge for Statute Lens.
//!
//! Each amendment contributes a rendered partial tree; contributions are
//! folded into one forest in which every content node appears once and
//! records which amendments touch it.
//!
//! # Key Types
//!
//! - [`Contribution`] -- One amendment's rendered partial tree
//! - [`MergedForest`] -- The identity map the fold accumulates into
//! - [`Forest`] -- Nested output with placeholder roots for broken chains
//! - [`Pipeline`] -- Concurrent build-then-shard-then-reduce driver

pub mod contribution;
pub mod error;
pub mod forest;
pub mod pipeline;

pub use contribution::Contribution;
pub use error::{MergeError, MergeResult};
pub use forest::{merge, merge_into, Forest, MergedForest, MergedNode};
pub use pipeline::{Pipeline, PipelineConfig, PipelineFailure, PipelineOutput, DEFAULT_SHARDS};
