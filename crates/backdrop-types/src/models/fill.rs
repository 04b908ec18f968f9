//! Solid and gradient fills, and their link encoding.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::error::{BackgroundError, Result};

const MAX_COLOR: u32 = 0x00FF_FFFF;

/// Fill of a background without file content, or the backdrop of a pattern.
///
/// Colors are 24-bit RGB values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackgroundFill {
    Solid { color: u32 },
    Gradient { top_color: u32, bottom_color: u32, rotation_angle: i32 },
    FreeformGradient { colors: Vec<u32> },
}

impl Default for BackgroundFill {
    fn default() -> Self {
        Self::Solid { color: 0 }
    }
}

impl BackgroundFill {
    pub fn solid(color: u32) -> Result<Self> {
        Ok(Self::Solid { color: check_color(color)? })
    }

    pub fn gradient(top_color: u32, bottom_color: u32, rotation_angle: i32) -> Result<Self> {
        Ok(Self::Gradient {
            top_color: check_color(top_color)?,
            bottom_color: check_color(bottom_color)?,
            rotation_angle: check_rotation(rotation_angle)?,
        })
    }

    pub fn freeform(colors: Vec<u32>) -> Result<Self> {
        if colors.len() != 3 && colors.len() != 4 {
            return Err(BackgroundError::InvalidFill {
                message: format!("freeform gradient needs 3 or 4 colors, got {}", colors.len()),
            });
        }
        for &color in &colors {
            check_color(color)?;
        }
        Ok(Self::FreeformGradient { colors })
    }

    /// Parse a locally-synthesizable background name such as `ff0000`,
    /// `ff0000-0000ff?rotation=90` or `ff0000~00ff00~0000ff`.
    pub fn from_link(name: &str) -> Result<Self> {
        let (colors, query) = split_link(name);
        if colors.contains('~') {
            let parsed = colors.split('~').map(parse_color).collect::<Result<Vec<_>>>()?;
            return Self::freeform(parsed);
        }
        if let Some((top, bottom)) = colors.split_once('-') {
            let rotation = query
                .and_then(|q| link_parameter(q, "rotation"))
                .map(|value| {
                    value.parse::<i32>().map_err(|_| BackgroundError::InvalidRotation { angle: -1 })
                })
                .transpose()?
                .unwrap_or(0);
            return Self::gradient(parse_color(top)?, parse_color(bottom)?, rotation);
        }
        Self::solid(parse_color(colors)?)
    }

    /// Inverse of [`BackgroundFill::from_link`].
    pub fn link(&self) -> String {
        match self {
            Self::Solid { color } => format_color(*color),
            Self::Gradient { top_color, bottom_color, rotation_angle } => {
                let mut link = format!("{}-{}", format_color(*top_color), format_color(*bottom_color));
                if *rotation_angle != 0 {
                    link.push_str(&format!("?rotation={}", rotation_angle));
                }
                link
            },
            Self::FreeformGradient { colors } => {
                colors.iter().map(|c| format_color(*c)).collect::<Vec<_>>().join("~")
            },
        }
    }

    /// Color part of the link, without rotation.
    pub(crate) fn color_link(&self) -> String {
        match self {
            Self::Gradient { top_color, bottom_color, .. } => {
                format!("{}-{}", format_color(*top_color), format_color(*bottom_color))
            },
            other => other.link(),
        }
    }

    pub const fn rotation_angle(&self) -> i32 {
        match self {
            Self::Gradient { rotation_angle, .. } => *rotation_angle,
            _ => 0,
        }
    }

    pub fn colors(&self) -> Vec<u32> {
        match self {
            Self::Solid { color } => vec![*color],
            Self::Gradient { top_color, bottom_color, .. } => vec![*top_color, *bottom_color],
            Self::FreeformGradient { colors } => colors.clone(),
        }
    }

    /// Every color of the fill is dark.
    pub fn is_dark(&self) -> bool {
        self.colors().into_iter().all(is_dark_color)
    }
}

fn check_color(color: u32) -> Result<u32> {
    if color > MAX_COLOR {
        return Err(BackgroundError::invalid_color(format!("{:#x}", color)));
    }
    Ok(color)
}

fn check_rotation(angle: i32) -> Result<i32> {
    if !(0..360).contains(&angle) || angle % 45 != 0 {
        return Err(BackgroundError::InvalidRotation { angle });
    }
    Ok(angle)
}

fn parse_color(hex: &str) -> Result<u32> {
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BackgroundError::invalid_color(hex));
    }
    u32::from_str_radix(hex, 16).map_err(|_| BackgroundError::invalid_color(hex))
}

fn format_color(color: u32) -> String {
    format!("{:06x}", color & MAX_COLOR)
}

// ITU-R BT.709 luma, scaled by 10_000.
fn is_dark_color(color: u32) -> bool {
    let r = (color >> 16) & 0xFF;
    let g = (color >> 8) & 0xFF;
    let b = color & 0xFF;
    2126 * r + 7152 * g + 722 * b < 128 * 10_000
}

/// Split a background name into its slug and its query string.
pub(crate) fn split_link(name: &str) -> (&str, Option<&str>) {
    match name.split_once('?') {
        Some((slug, query)) => (slug, Some(query)),
        None => (name, None),
    }
}

/// Last value of `key` in a link query string.
pub(crate) fn link_parameter<'a>(query: &'a str, key: &str) -> Option<Cow<'a, str>> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v)
        .last()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_link() {
        let fill = BackgroundFill::from_link("FF8000").unwrap();
        assert_eq!(fill, BackgroundFill::Solid { color: 0xFF8000 });
        assert_eq!(fill.link(), "ff8000");
    }

    #[test]
    fn test_gradient_link_with_rotation() {
        let fill = BackgroundFill::from_link("ff0000-0000ff?rotation=90").unwrap();
        assert_eq!(
            fill,
            BackgroundFill::Gradient { top_color: 0xFF0000, bottom_color: 0x0000FF, rotation_angle: 90 }
        );
        assert_eq!(fill.link(), "ff0000-0000ff?rotation=90");

        let unrotated = BackgroundFill::from_link("ff0000-0000ff").unwrap();
        assert_eq!(unrotated.link(), "ff0000-0000ff");
    }

    #[test]
    fn test_freeform_link() {
        let fill = BackgroundFill::from_link("ff0000~00ff00~0000ff").unwrap();
        assert_eq!(fill.colors(), vec![0xFF0000, 0x00FF00, 0x0000FF]);
        assert_eq!(fill.link(), "ff0000~00ff00~0000ff");

        assert!(BackgroundFill::from_link("ff0000~00ff00").is_err());
    }

    #[test]
    fn test_invalid_links() {
        assert!(matches!(
            BackgroundFill::from_link("xyz"),
            Err(BackgroundError::InvalidColor { .. })
        ));
        assert!(matches!(
            BackgroundFill::from_link("ff0000-0000ff?rotation=30"),
            Err(BackgroundError::InvalidRotation { angle: 30 })
        ));
        assert!(BackgroundFill::from_link("").is_err());
    }

    #[test]
    fn test_darkness() {
        assert!(BackgroundFill::solid(0x101010).unwrap().is_dark());
        assert!(!BackgroundFill::solid(0xFFFFFF).unwrap().is_dark());
        assert!(!BackgroundFill::gradient(0x000000, 0xFFFFFF, 0).unwrap().is_dark());
    }
}
