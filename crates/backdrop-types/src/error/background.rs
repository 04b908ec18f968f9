//! Errors reported to callers of the background manager.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::RemoteError;

/// Caller-facing error of every background operation.
///
/// `Clone` so one outcome can be delivered to every waiter that shared a
/// de-duplicated request.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum BackgroundError {
    /// Slug lookup with an empty slug
    #[error("Background name must be non-empty")]
    EmptyName,

    /// A color component of a fill link or settings is malformed
    #[error("Invalid background color: {value}")]
    InvalidColor {
        /// Offending input fragment
        value: String,
    },

    /// Gradient rotation outside `0..360` or not a multiple of 45
    #[error("Invalid gradient rotation angle: {angle}")]
    InvalidRotation {
        /// Offending angle
        angle: i32,
    },

    /// Pattern intensity outside `-100..=100`
    #[error("Invalid pattern intensity: {intensity}")]
    InvalidIntensity {
        /// Offending intensity
        intensity: i32,
    },

    /// Structurally invalid fill (e.g. wrong number of freeform colors)
    #[error("Invalid background fill: {message}")]
    InvalidFill {
        /// Description of the problem
        message: String,
    },

    /// A file-backed type was requested without an input background
    #[error("Input background must be non-empty for the background type")]
    InputRequired,

    /// A local file was supplied for a type that has no file content
    #[error("Can't specify local file for the background type")]
    LocalFileNotAllowed,

    /// The supplied file can't be uploaded as a background
    #[error("{reason}")]
    FileUnusable {
        /// Why the file was refused
        reason: String,
    },

    /// No background with this identifier is known
    #[error("Background not found: {id}")]
    NotFound {
        /// Raw identifier
        id: i64,
    },

    /// Requested type kind differs from the stored background's kind
    #[error("Background type mismatch")]
    TypeMismatch,

    /// The server rejected the request
    #[error("Remote error {code}: {message}")]
    Remote {
        /// Server error code
        code: i32,
        /// Server error message
        message: String,
    },

    /// The server answered an upload with an unusable background
    #[error("Received invalid upload result: {message}")]
    InvalidUploadResult {
        /// What was wrong with the result
        message: String,
    },

    /// An already-uploaded file could not be matched to a background
    #[error("Failed to reupload background")]
    ReuploadFailed,

    /// The server response could not be turned into a valid background
    #[error("Invalid server response: {message}")]
    InvalidResponse {
        /// What was wrong with the response
        message: String,
    },

    /// Durable storage failed
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure
        message: String,
    },

    /// The manager is shutting down or went away before answering
    #[error("Request aborted")]
    Aborted,
}

impl BackgroundError {
    /// Numeric code in the server's convention: 400 for bad input, 500 for
    /// internal failures, the server's own code for remote errors.
    pub const fn code(&self) -> i32 {
        match self {
            Self::EmptyName
            | Self::InvalidColor { .. }
            | Self::InvalidRotation { .. }
            | Self::InvalidIntensity { .. }
            | Self::InvalidFill { .. }
            | Self::InputRequired
            | Self::LocalFileNotAllowed
            | Self::FileUnusable { .. }
            | Self::NotFound { .. }
            | Self::TypeMismatch => 400,
            Self::Remote { code, .. } => *code,
            Self::InvalidUploadResult { .. }
            | Self::ReuploadFailed
            | Self::InvalidResponse { .. }
            | Self::Storage { .. }
            | Self::Aborted => 500,
        }
    }

    /// Check if this error was caused by the caller's input.
    pub const fn is_input_error(&self) -> bool {
        self.code() == 400 && !matches!(self, Self::Remote { .. })
    }

    pub fn invalid_color(value: impl Into<String>) -> Self {
        Self::InvalidColor { value: value.into() }
    }

    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage { message: message.to_string() }
    }
}

impl From<RemoteError> for BackgroundError {
    fn from(e: RemoteError) -> Self {
        // Errors without a code are reported as internal failures.
        let code = if e.code > 0 { e.code } else { 500 };
        Self::Remote { code, message: e.message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(BackgroundError::EmptyName.code(), 400);
        assert!(BackgroundError::TypeMismatch.is_input_error());
        assert_eq!(BackgroundError::Aborted.code(), 500);

        let remote: BackgroundError = RemoteError::new(400, "WALLPAPER_INVALID").into();
        assert_eq!(remote.code(), 400);
        assert!(!remote.is_input_error());

        let uncoded: BackgroundError = RemoteError::new(0, "broken").into();
        assert_eq!(uncoded.code(), 500);
    }
}
