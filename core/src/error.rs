//! Repository error type shared by every port.

use thiserror::Error;

/// Errors returned by repository implementations.
///
/// Storage failures carry the operation that failed so the service layer can
/// log them with context without inspecting driver errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The addressed row does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Entity name (e.g. "User")
        entity: &'static str,
        /// Identifier as text
        id: String,
    },

    /// A business rule or uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed or is unreachable.
    #[error("Storage error during {operation}: {reason}")]
    Storage {
        /// Operation being performed
        operation: &'static str,
        /// Driver error message
        reason: String,
    },
}

impl RepositoryError {
    /// Shorthand for [`RepositoryError::NotFound`].
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`RepositoryError::Storage`].
    #[must_use]
    pub fn storage(operation: &'static str, reason: impl ToString) -> Self {
        Self::Storage {
            operation,
            reason: reason.to_string(),
        }
    }
}

/// Result alias for repository calls.
pub type RepositoryResult<T> = Result<T, RepositoryError>;
