use common::Version;
use domain::{DomainError, ValidationErrors};
use store::StoreError;
use thiserror::Error;

/// Errors returned by the application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The addressed entity does not exist, or not under the given parent.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The caller's copy is older than the stored entity.
    #[error("{entity} {id} was modified: expected version {expected}, found {actual}")]
    StaleVersion {
        entity: &'static str,
        id: i64,
        expected: Version,
        actual: Version,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str, id: impl Into<i64>) -> Self {
        ServiceError::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        ServiceError::Domain(DomainError::Validation(errors))
    }
}

/// Compares the version a caller last saw against the stored one.
pub(crate) fn check_version(
    entity: &'static str,
    id: i64,
    expected: Option<Version>,
    actual: Version,
) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => {
            tracing::warn!(entity, id, %expected, %actual, "rejecting update of stale copy");
            Err(ServiceError::StaleVersion {
                entity,
                id,
                expected,
                actual,
            })
        }
        _ => Ok(()),
    }
}

/// Result type for service operations.
pub type Result<T> = std::result::Result<T, ServiceError>;
