//! Storage-layer errors.

use backdrop_types::{BackgroundError, IntegrityError};
use thiserror::Error;

/// Failure of a key-value store or of the record codec.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    #[error("Unsupported record schema version {0}")]
    UnsupportedVersion(u8),

    #[error("Empty record")]
    EmptyRecord,

    #[error("Invalid record: {0}")]
    Integrity(#[from] IntegrityError),

    #[error("Invalid counter value: {0:?}")]
    InvalidCounter(String),

    #[error("Local background id range exhausted")]
    IdRangeExhausted,

    #[error("Invalid table name: {0:?}")]
    InvalidTable(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for BackgroundError {
    fn from(e: StorageError) -> Self {
        Self::storage(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_maps_to_internal_code() {
        let error: BackgroundError = StorageError::UnsupportedVersion(9).into();
        assert_eq!(error.code(), 500);
        assert_eq!(
            error,
            BackgroundError::Storage { message: "Unsupported record schema version 9".to_string() }
        );
    }
}
