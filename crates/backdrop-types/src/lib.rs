//! # Backdrop Types
//!
//! Core types, models, and error definitions for the Backdrop background
//! manager.
//!
//! - **`error`** - Typed error hierarchy (caller errors, remote errors, integrity)
//! - **`models`** - Identifiers, fills, background types, the entity record
//! - **`protocol`** - Requests and responses exchanged with the transport
//!
//! ## Architecture Role
//!
//! ```text
//!      backdrop-types (this crate)
//!               │
//!               ▼
//!        backdrop-core
//!   (registry, sync, uploads, selection)
//! ```

pub mod error;
pub mod models;
pub mod protocol;

pub use error::{BackgroundError, ConfigError, IntegrityError, RemoteError, Result};

pub use models::{
    background_url, is_local_background_name, Background, BackgroundFill, BackgroundId,
    BackgroundKind, BackgroundType, BackgroundView, FileId, InputBackground, ManagerConfig,
    ReferenceSourceId, Update, MAX_LOCAL_BACKGROUND_ID,
};
