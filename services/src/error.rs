//! Error types returned by the domain services.

use recsys_core::error::RepositoryError;
use thiserror::Error;

/// Result type alias for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;

/// What a caller of a service can observe going wrong.
///
/// Business outcomes (`NotFound`, `Conflict`, `InvalidCredentials`,
/// `Validation`) are distinct from `Infrastructure`, which covers every
/// store failure the caller cannot fix by changing the request.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The addressed record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The request collides with existing state (duplicate like, taken email).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Unknown email, wrong password, or an unusable token.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request itself is malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A backing store failed.
    #[error("Infrastructure failure: {0}")]
    Infrastructure(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
            RepositoryError::Conflict(message) => Self::Conflict(message),
            storage @ RepositoryError::Storage { .. } => Self::Infrastructure(storage.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repository_errors_map_to_service_errors() {
        assert_eq!(
            ServiceError::from(RepositoryError::not_found("Product", 9)),
            ServiceError::NotFound("Product 9".to_string())
        );
        assert!(matches!(
            ServiceError::from(RepositoryError::Conflict("like exists".into())),
            ServiceError::Conflict(_)
        ));
        assert!(matches!(
            ServiceError::from(RepositoryError::storage("get user", "connection reset")),
            ServiceError::Infrastructure(_)
        ));
    }
}
