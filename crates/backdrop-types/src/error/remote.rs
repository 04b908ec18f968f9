//! Errors delivered by the transport collaborator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error answer to a remote request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct RemoteError {
    /// Numeric error code (HTTP-like: 4xx client, 429 flood, 5xx server)
    pub code: i32,
    /// Upper-case error tag, e.g. `WALLPAPER_INVALID`
    pub message: String,
}

impl RemoteError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub const fn is_flood_wait(&self) -> bool {
        self.code == 429
    }

    pub const fn is_server_error(&self) -> bool {
        self.code >= 500
    }

    /// Part index of a `FILE_PART_<n>_MISSING` error.
    pub fn missing_file_part(&self) -> Option<u32> {
        self.message.strip_prefix("FILE_PART_")?.strip_suffix("_MISSING")?.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_part() {
        assert_eq!(RemoteError::new(400, "FILE_PART_7_MISSING").missing_file_part(), Some(7));
        assert_eq!(RemoteError::new(400, "FILE_PART_X_MISSING").missing_file_part(), None);
        assert_eq!(RemoteError::new(400, "FILE_PARTS_INVALID").missing_file_part(), None);
    }

    #[test]
    fn test_classification() {
        assert!(RemoteError::new(429, "FLOOD_WAIT_3").is_flood_wait());
        assert!(RemoteError::new(502, "BAD_GATEWAY").is_server_error());
        assert!(!RemoteError::new(400, "BAD").is_server_error());
    }
}
