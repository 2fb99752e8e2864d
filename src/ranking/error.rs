//! Error types for leaderboard scoring

use thiserror::Error;

use crate::models::{Category, SubjectId};

/// Result type for scoring operations
pub type ScoringResult<T> = Result<T, ScoringError>;

/// Failures raised while computing one category's ranking
///
/// Every variant names its category: a scoring failure is scoped to the
/// leaderboard it happened in and never aborts sibling categories.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The scoring data source could not be read
    #[error("scoring source unavailable for '{category}': {reason}")]
    SourceUnavailable { category: Category, reason: String },

    /// The source returned the same subject twice
    #[error("scoring source returned subject {subject_id} more than once for '{category}'")]
    DuplicateSubject {
        category: Category,
        subject_id: SubjectId,
    },
}

impl ScoringError {
    /// Create a source-unavailable error
    pub fn unavailable(category: Category, reason: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            category,
            reason: reason.into(),
        }
    }

    /// Category the failure is scoped to
    pub fn category(&self) -> Category {
        match self {
            Self::SourceUnavailable { category, .. } | Self::DuplicateSubject { category, .. } => {
                *category
            }
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SourceUnavailable { .. })
    }
}
