use serde::{Deserialize, Serialize};

use crate::models::{BackgroundFill, BackgroundId};

/// Rendering settings as the server transmits them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallpaperSettings {
    pub is_blurred: bool,
    pub is_moving: bool,
    pub background_color: Option<u32>,
    pub second_background_color: Option<u32>,
    pub third_background_color: Option<u32>,
    pub fourth_background_color: Option<u32>,
    pub intensity: Option<i32>,
    pub rotation: Option<i32>,
}

impl WallpaperSettings {
    pub fn from_fill(fill: &BackgroundFill) -> Self {
        let colors = fill.colors();
        let rotation = fill.rotation_angle();
        Self {
            background_color: colors.first().copied(),
            second_background_color: colors.get(1).copied(),
            third_background_color: colors.get(2).copied(),
            fourth_background_color: colors.get(3).copied(),
            rotation: (rotation != 0).then_some(rotation),
            ..Self::default()
        }
    }

    /// Fill described by the color fields. Out-of-range values coming from
    /// the server are normalized rather than rejected.
    pub fn fill(&self) -> BackgroundFill {
        let first = self.background_color.unwrap_or(0) & 0x00FF_FFFF;
        if let (Some(second), Some(third)) = (self.second_background_color, self.third_background_color) {
            let mut colors = vec![first, second & 0x00FF_FFFF, third & 0x00FF_FFFF];
            if let Some(fourth) = self.fourth_background_color {
                colors.push(fourth & 0x00FF_FFFF);
            }
            return BackgroundFill::FreeformGradient { colors };
        }
        if let Some(second) = self.second_background_color {
            return BackgroundFill::Gradient {
                top_color: first,
                bottom_color: second & 0x00FF_FFFF,
                rotation_angle: normalize_rotation(self.rotation.unwrap_or(0)),
            };
        }
        BackgroundFill::Solid { color: first }
    }
}

fn normalize_rotation(angle: i32) -> i32 {
    let angle = angle.rem_euclid(360);
    (angle / 45) * 45
}

/// Document carrying the file content of a background, as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: i64,
    pub access_hash: i64,
    pub mime_type: String,
    pub size: u64,
}

/// Background description received from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RemoteWallpaper {
    /// File-backed wallpaper or pattern; `document` is `None` when the
    /// server sent an empty document.
    File {
        id: BackgroundId,
        access_hash: i64,
        slug: String,
        is_creator: bool,
        is_default: bool,
        is_dark: bool,
        is_pattern: bool,
        document: Option<RemoteDocument>,
        settings: Option<WallpaperSettings>,
    },
    /// Server-side fill without file content
    NoFile {
        id: BackgroundId,
        is_default: bool,
        is_dark: bool,
        settings: Option<WallpaperSettings>,
    },
}

impl RemoteWallpaper {
    pub const fn id(&self) -> BackgroundId {
        match self {
            Self::File { id, .. } | Self::NoFile { id, .. } => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_is_normalized() {
        let settings = WallpaperSettings {
            background_color: Some(0x1),
            second_background_color: Some(0x2),
            rotation: Some(-100),
            ..WallpaperSettings::default()
        };
        assert_eq!(settings.fill().rotation_angle(), 225);
    }

    #[test]
    fn test_missing_colors_default_to_black() {
        assert_eq!(WallpaperSettings::default().fill(), BackgroundFill::Solid { color: 0 });
    }
}
