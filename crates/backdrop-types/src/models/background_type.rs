//! Rendering type of a background: wallpaper, pattern or plain fill.

use serde::{Deserialize, Serialize};

use super::fill::{link_parameter, split_link, BackgroundFill};
use crate::error::{BackgroundError, Result};
use crate::protocol::WallpaperSettings;

/// How a background is rendered.
///
/// `Wallpaper` and `Pattern` are backed by file content; `Fill` is fully
/// described by its colors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackgroundType {
    Wallpaper { is_blurred: bool, is_moving: bool },
    Pattern { fill: BackgroundFill, intensity: i32, is_moving: bool },
    Fill { fill: BackgroundFill },
}

/// Variant tag of [`BackgroundType`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackgroundKind {
    Wallpaper,
    Pattern,
    Fill,
}

impl Default for BackgroundType {
    fn default() -> Self {
        Self::Fill { fill: BackgroundFill::default() }
    }
}

impl BackgroundType {
    pub const fn wallpaper(is_blurred: bool, is_moving: bool) -> Self {
        Self::Wallpaper { is_blurred, is_moving }
    }

    pub fn pattern(fill: BackgroundFill, intensity: i32, is_moving: bool) -> Result<Self> {
        if !(-100..=100).contains(&intensity) {
            return Err(BackgroundError::InvalidIntensity { intensity });
        }
        Ok(Self::Pattern { fill, intensity, is_moving })
    }

    pub const fn fill(fill: BackgroundFill) -> Self {
        Self::Fill { fill }
    }

    pub const fn kind(&self) -> BackgroundKind {
        match self {
            Self::Wallpaper { .. } => BackgroundKind::Wallpaper,
            Self::Pattern { .. } => BackgroundKind::Pattern,
            Self::Fill { .. } => BackgroundKind::Fill,
        }
    }

    /// The background owns file content (an image or a pattern).
    pub const fn has_file(&self) -> bool {
        match self {
            Self::Wallpaper { .. } | Self::Pattern { .. } => true,
            Self::Fill { .. } => false,
        }
    }

    pub fn same_kind(&self, other: &Self) -> bool {
        self.kind() == other.kind()
    }

    /// Fill of a fill-typed background.
    pub const fn as_fill(&self) -> Option<&BackgroundFill> {
        match self {
            Self::Fill { fill } => Some(fill),
            _ => None,
        }
    }

    /// MIME type used when uploading the file content of this type.
    pub const fn mime_type(&self) -> Option<&'static str> {
        match self {
            Self::Wallpaper { .. } => Some("image/jpeg"),
            Self::Pattern { .. } => Some("image/png"),
            Self::Fill { .. } => None,
        }
    }

    /// Link parameters describing this type. For fills this is the whole
    /// locally-synthesizable name.
    pub fn link(&self) -> String {
        match self {
            Self::Wallpaper { is_blurred, is_moving } => {
                let modes = mode_list(*is_blurred, *is_moving);
                if modes.is_empty() {
                    String::new()
                } else {
                    format!("mode={}", modes)
                }
            },
            Self::Pattern { fill, intensity, is_moving } => {
                let mut link = format!("bg_color={}&intensity={}", fill.color_link(), intensity);
                if fill.rotation_angle() != 0 {
                    link.push_str(&format!("&rotation={}", fill.rotation_angle()));
                }
                if *is_moving {
                    link.push_str("&mode=motion");
                }
                link
            },
            Self::Fill { fill } => fill.link(),
        }
    }

    /// Overlay parameters from the query part of `name` (`slug?mode=blur`)
    /// onto this type. Unknown or malformed parameters are ignored.
    pub fn apply_parameters_from_link(&mut self, name: &str) {
        let Some(query) = split_link(name).1 else {
            return;
        };
        match self {
            Self::Wallpaper { is_blurred, is_moving } => {
                if let Some(mode) = link_parameter(query, "mode") {
                    *is_blurred = has_mode(&mode, "blur");
                    *is_moving = has_mode(&mode, "motion");
                }
            },
            Self::Pattern { fill, intensity, is_moving } => {
                if let Some(mode) = link_parameter(query, "mode") {
                    *is_moving = has_mode(&mode, "motion");
                }
                if let Some(value) = link_parameter(query, "intensity") {
                    match value.parse::<i32>() {
                        Ok(parsed) if (-100..=100).contains(&parsed) => *intensity = parsed,
                        _ => {},
                    }
                }
                let rotation = link_parameter(query, "rotation");
                let colors = link_parameter(query, "bg_color")
                    .map(|c| c.into_owned())
                    .or_else(|| rotation.as_ref().map(|_| fill.color_link()));
                if let Some(colors) = colors {
                    let candidate = match &rotation {
                        Some(angle) => format!("{}?rotation={}", colors, angle),
                        None => colors,
                    };
                    if let Ok(parsed) = BackgroundFill::from_link(&candidate) {
                        *fill = parsed;
                    }
                }
            },
            Self::Fill { .. } => {},
        }
    }

    /// Build a type from server-provided settings.
    pub fn from_settings(is_fill: bool, is_pattern: bool, settings: Option<&WallpaperSettings>) -> Self {
        let settings = settings.cloned().unwrap_or_default();
        if is_fill {
            return Self::Fill { fill: settings.fill() };
        }
        if is_pattern {
            return Self::Pattern {
                fill: settings.fill(),
                intensity: settings.intensity.unwrap_or(0).clamp(-100, 100),
                is_moving: settings.is_moving,
            };
        }
        Self::Wallpaper { is_blurred: settings.is_blurred, is_moving: settings.is_moving }
    }

    /// Settings sent to the server when installing or uploading this type.
    pub fn to_settings(&self) -> WallpaperSettings {
        match self {
            Self::Wallpaper { is_blurred, is_moving } => WallpaperSettings {
                is_blurred: *is_blurred,
                is_moving: *is_moving,
                ..WallpaperSettings::default()
            },
            Self::Pattern { fill, intensity, is_moving } => WallpaperSettings {
                is_moving: *is_moving,
                intensity: Some(*intensity),
                ..WallpaperSettings::from_fill(fill)
            },
            Self::Fill { fill } => WallpaperSettings::from_fill(fill),
        }
    }
}

fn mode_list(is_blurred: bool, is_moving: bool) -> String {
    let mut modes = Vec::new();
    if is_blurred {
        modes.push("blur");
    }
    if is_moving {
        modes.push("motion");
    }
    modes.join("+")
}

// Form decoding turns '+' into a space.
fn has_mode(modes: &str, mode: &str) -> bool {
    modes.split(|c| c == ' ' || c == '+').any(|m| m.eq_ignore_ascii_case(mode))
}
