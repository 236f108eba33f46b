use lex_types::DiffId;

/// Errors produced by the merge pipeline.
///
/// Per-diff tree failures are not errors here; they are reported in
/// [`crate::PipelineOutput::failures`].
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(String),

    /// Two different amendments share one diff id.
    #[error("diff id {0} is used by more than one amendment")]
    DuplicateDiff(DiffId),

    /// The pipeline configuration could not be parsed or is invalid.
    #[error("invalid pipeline config: {0}")]
    Config(String),
}

impl From<tokio::task::JoinError> for MergeError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

impl From<lex_diff::DiffError> for MergeError {
    fn from(err: lex_diff::DiffError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<toml::de::Error> for MergeError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
