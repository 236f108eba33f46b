//! Error types for tree assembly.

use lex_types::ContentId;

/// Errors that can occur while resolving chains or assembling trees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The requested target has no record in the snapshot.
    #[error("content node not found: {0}")]
    NotFound(ContentId),

    /// A parent walk revisited a node or exceeded the configured depth.
    #[error("cycle detected walking parents of {start} after {depth} hops")]
    CycleDetected {
        /// The node the walk started from.
        start: ContentId,
        /// Hops taken before the walk was abandoned.
        depth: usize,
    },

    /// Assembled nodes whose parent links loop without reaching a root.
    #[error("parent links of {key} form a cycle with no root")]
    UnrootedCycle {
        /// Debug rendering of one node on the cycle.
        key: String,
    },

    /// An ident path could not be parsed.
    #[error("invalid ident path {ident:?}: {reason}")]
    InvalidIdent { ident: String, reason: String },

    /// Ident-path assembly was given a record without an ident.
    #[error("record {0} has no ident path")]
    MissingIdent(ContentId),
}

/// Convenience alias for tree results.
pub type TreeResult<T> = Result<T, TreeError>;
