//! Wire-level request and response shapes exchanged with the transport.
//!
//! These mirror the server API one-to-one; nothing here is trusted until the
//! manager has validated it.

mod wallpaper;

pub use wallpaper::{RemoteDocument, RemoteWallpaper, WallpaperSettings};

use serde::{Deserialize, Serialize};

use crate::models::BackgroundId;

/// Reference to a server-side background inside a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputWallpaper {
    /// File-backed background, authenticated by its access hash
    ById { id: BackgroundId, access_hash: i64 },
    /// Background addressed by its public slug
    BySlug { slug: String },
    /// Server-side fill background
    NoFile { id: BackgroundId },
}

/// Opaque handle produced by the file subsystem after the bytes of a file
/// were transferred; passed back to the server to create the background.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadHandle {
    pub upload_id: i64,
    pub parts: u32,
    pub name: String,
}

/// Outbound request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request {
    /// List of installed backgrounds; `hash` of the last answer enables
    /// a not-modified reply
    GetCatalog { hash: i64 },
    /// Single background by id or slug
    GetWallpaper { wallpaper: InputWallpaper },
    /// Mark a background as installed with the given settings
    Install { wallpaper: InputWallpaper, settings: WallpaperSettings },
    /// Remove a background from the installed list
    Unsave { wallpaper: InputWallpaper },
    /// Restore the default installed list
    ResetAll,
    /// Create a background from uploaded file content
    Upload { file: UploadHandle, mime_type: String, settings: WallpaperSettings },
}

impl Request {
    /// Short name used in logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetCatalog { .. } => "get_catalog",
            Self::GetWallpaper { .. } => "get_wallpaper",
            Self::Install { .. } => "install",
            Self::Unsave { .. } => "unsave",
            Self::ResetAll => "reset_all",
            Self::Upload { .. } => "upload",
        }
    }
}

/// Answer to [`Request::GetCatalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CatalogResponse {
    NotModified,
    Wallpapers { hash: i64, wallpapers: Vec<RemoteWallpaper> },
}

/// Successful answer to a [`Request`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    Catalog(CatalogResponse),
    Wallpaper(RemoteWallpaper),
    Bool(bool),
}

impl Response {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Catalog(_) => "catalog",
            Self::Wallpaper(_) => "wallpaper",
            Self::Bool(_) => "bool",
        }
    }
}
