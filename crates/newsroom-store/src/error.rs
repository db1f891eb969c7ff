use thiserror::Error;

/// Errors that can occur within the content store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No article with the given ID exists in the store.
    #[error("Article not found: {id}")]
    NotFound { id: String },

    /// A timestamp field failed to parse as ISO-8601.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The store could not be reached (transient — retried next cycle).
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
