//! Error types for the document store.

use thiserror::Error;

/// Result type alias for document store operations.
pub type DocStoreResult<T> = Result<T, DocStoreError>;

/// Errors that can occur while reading or writing documents.
#[derive(Error, Debug)]
pub enum DocStoreError {
    /// Document does not exist
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// A create collided with an existing document
    #[error("Document already exists: {collection}/{id}")]
    AlreadyExists { collection: String, id: String },

    /// Field name used in a filter or ordering is not a plain identifier
    #[error("Invalid field name: {0}")]
    InvalidField(String),

    /// Pagination cursor could not be decoded
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Document body is not a JSON object, or could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DocStoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        DocStoreError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn already_exists(collection: &str, id: &str) -> Self {
        DocStoreError::AlreadyExists {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }
}
