//! Typed error definitions for Backdrop.
//!
//! All errors are:
//!
//! - **Cloneable** so a single outcome can be fanned out to many waiters
//! - **Serializable** for logging pipelines and IPC via serde
//! - **Matchable** for error handling logic via enum variants

mod background;
mod config;
mod integrity;
mod remote;

pub use background::BackgroundError;
pub use config::ConfigError;
pub use integrity::IntegrityError;
pub use remote::RemoteError;

/// Standard Result type using BackgroundError.
pub type Result<T> = std::result::Result<T, BackgroundError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_serialization() {
        let err = BackgroundError::NotFound { id: 42 };

        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("NotFound"));
        assert!(json.contains("42"));

        let deserialized: BackgroundError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }

    #[test]
    fn test_error_display() {
        let err = BackgroundError::Remote { code: 400, message: "WALLPAPER_INVALID".to_string() };

        let msg = format!("{}", err);
        assert!(msg.contains("400"));
        assert!(msg.contains("WALLPAPER_INVALID"));
    }
}
