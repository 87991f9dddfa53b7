//! Retry classification for persistence failures.

use super::error::DatabaseError;

/// Categorical signature of a persistence failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    UniqueViolation,
    NotFound,
    Other,
}

/// Whether a failed attempt is worth repeating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// The outcome cannot change on retry
    Terminal,
    /// Attributable to a transient condition
    Retryable,
}

/// Decides whether an error may be retried.
///
/// Implementations look only at the error itself: never at the attempt
/// number or the operation being run.
pub trait ErrorClassifier<E>: Send + Sync {
    fn classify(&self, error: &E) -> Classification;
}

/// Maps a category to its retry classification
pub fn classify_category(category: ErrorCategory) -> Classification {
    match category {
        ErrorCategory::UniqueViolation | ErrorCategory::NotFound => Classification::Terminal,
        ErrorCategory::Other => Classification::Retryable,
    }
}

/// Classifier for [`DatabaseError`]: uniqueness and not-found failures are
/// terminal, everything else is retryable
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseErrorClassifier;

impl ErrorClassifier<DatabaseError> for DatabaseErrorClassifier {
    fn classify(&self, error: &DatabaseError) -> Classification {
        classify_category(error.category())
    }
}
