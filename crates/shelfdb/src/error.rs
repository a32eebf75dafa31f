use thiserror::Error;

use crate::types::PlaylistId;

/// Errors raised by the library stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The playlist row no longer exists.
    #[error("playlist not found: {0}")]
    NotFound(PlaylistId),

    /// Rejected before touching storage.
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("sound id list could not be encoded: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking database task panicked or was cancelled.
    #[error("database task failed: {0}")]
    Task(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

pub type Result<T, E = StoreError> = std::result::Result<T, E>;
