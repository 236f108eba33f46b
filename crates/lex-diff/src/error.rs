//! Error types for the diff crate.

/// Errors that can occur while diffing or rendering a field.
///
/// Only [`DiffError::Config`] and [`DiffError::Pattern`] escape
/// [`crate::FieldDiffer::new`]; once built, a differ renders a failing field as
/// unchanged instead.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// Citation markup was unbalanced or incomplete.
    #[error("malformed citation markup at byte {offset}: {reason}")]
    MalformedMarkup { offset: usize, reason: String },

    /// A configuration value is out of range.
    #[error("invalid diff config: {0}")]
    Config(String),

    /// The citation pattern failed to compile.
    #[error("citation pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
