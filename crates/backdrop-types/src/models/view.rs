//! Read-only projections handed to the UI layer.

use serde::{Deserialize, Serialize};

use super::background::Background;
use super::background_type::BackgroundType;
use super::ids::{BackgroundId, FileId};

/// Flat snapshot of a background together with the type it is shown with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundView {
    pub id: BackgroundId,
    pub is_default: bool,
    pub is_dark: bool,
    pub name: String,
    pub document: Option<FileId>,
    pub background_type: BackgroundType,
}

impl BackgroundView {
    /// Project `background`, rendered with `background_type` (which may be a
    /// selection-specific variant of the background's own type).
    pub fn project(background: &Background, background_type: &BackgroundType) -> Self {
        Self {
            id: background.id,
            is_default: background.is_default,
            is_dark: background.is_dark,
            name: background.name.clone(),
            document: background.file_id(),
            background_type: background_type.clone(),
        }
    }
}

/// Notification emitted towards the update bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Update {
    /// The selected background of one theme variant changed
    SelectedBackground { for_dark_theme: bool, background: Option<BackgroundView> },
}
