use common::Version;
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update targeted a row that does not exist (or not under the given parent).
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// The row was modified since it was read.
    /// The version carried by the entity did not match the stored version.
    #[error(
        "Concurrency conflict for {entity} {id}: expected version {expected}, found {actual}"
    )]
    VersionConflict {
        entity: &'static str,
        id: i64,
        expected: Version,
        actual: Version,
    },

    /// A delete was refused because other rows still point at the row.
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    Referenced {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    /// A write points at a row that does not exist.
    #[error("Referenced {entity} does not exist")]
    MissingReference { entity: &'static str },

    /// A child was saved without being attached to its parent.
    #[error("{entity} is not attached to a beer order")]
    Detached { entity: &'static str },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded.
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl StoreError {
    pub(crate) fn version_conflict(
        entity: &'static str,
        id: i64,
        expected: Version,
        actual: Version,
    ) -> Self {
        metrics::counter!("store_version_conflicts_total", "entity" => entity).increment(1);
        tracing::warn!(entity, id, %expected, %actual, "optimistic lock conflict");
        StoreError::VersionConflict {
            entity,
            id,
            expected,
            actual,
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
