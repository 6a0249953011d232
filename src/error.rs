use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced to the caller of the pipeline.
#[derive(Debug, Error)]
pub enum DataError {
    /// The input table could not be produced. Fatal to session start.
    #[error("data unavailable ({}): {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },

    /// Filter bounds or selections that cannot be evaluated.
    #[error("invalid filter criteria: {0}")]
    InvalidCriteria(String),
}

impl DataError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DataError::Unavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
