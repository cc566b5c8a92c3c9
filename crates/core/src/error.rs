use thiserror::Error;

/// Errors raised by the campaign and snapshot stores.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Campaign not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}
