//! Storage layer error types.

use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database driver error, passed through unchanged
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Driver name not recognized
    #[error("unsupported database {0}")]
    UnsupportedDriver(String),

    /// Connection string could not be read
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Query references a field that is not a document column
    #[error("Invalid field: {0}")]
    InvalidField(String),

    /// Query targets an entity kind this store does not hold
    #[error("Unsupported kind: {0}")]
    UnsupportedKind(String),

    /// Query is well-formed but not allowed for the operation
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage client has been closed
    #[error("Storage closed")]
    Closed,
}

impl StorageError {
    /// True if the error means the requested entity does not exist.
    ///
    /// Backends signal a missing row differently, so callers should use this
    /// instead of matching on variants.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound(_) | StorageError::Sqlx(sqlx::Error::RowNotFound)
        )
    }
}
