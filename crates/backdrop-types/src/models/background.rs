//! The background entity record.

use super::background_type::BackgroundType;
use super::fill::split_link;
use super::ids::{BackgroundId, FileId};
use crate::error::IntegrityError;

/// Names up to this length are always synthesized locally.
const MAX_LOCAL_NAME_LENGTH: usize = 13;

/// A background known to this client.
///
/// The file id is present exactly when the type has file content; the
/// constructor refuses anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Background {
    pub id: BackgroundId,
    pub access_hash: i64,
    pub name: String,
    pub is_creator: bool,
    pub is_default: bool,
    pub is_dark: bool,
    background_type: BackgroundType,
    file_id: Option<FileId>,
}

impl Background {
    pub fn new(
        id: BackgroundId,
        name: impl Into<String>,
        background_type: BackgroundType,
        file_id: Option<FileId>,
    ) -> Result<Self, IntegrityError> {
        if !id.is_valid() {
            return Err(IntegrityError::InvalidId(id.get()));
        }
        let file_id = file_id.filter(|f| f.is_valid());
        if file_id.is_some() != background_type.has_file() {
            return Err(IntegrityError::FileMismatch {
                has_file: background_type.has_file(),
                has_file_id: file_id.is_some(),
            });
        }
        Ok(Self {
            id,
            access_hash: 0,
            name: name.into(),
            is_creator: false,
            is_default: false,
            is_dark: false,
            background_type,
            file_id,
        })
    }

    /// Local fill background, named by its fill link.
    pub fn local_fill(id: BackgroundId, background_type: BackgroundType, is_default: bool, is_dark: bool) -> Result<Self, IntegrityError> {
        let name = background_type.link();
        let mut background = Self::new(id, name, background_type, None)?;
        background.is_creator = true;
        background.is_default = is_default;
        background.is_dark = is_dark;
        Ok(background)
    }

    pub fn with_access_hash(mut self, access_hash: i64) -> Self {
        self.access_hash = access_hash;
        self
    }

    pub fn with_flags(mut self, is_creator: bool, is_default: bool, is_dark: bool) -> Self {
        self.is_creator = is_creator;
        self.is_default = is_default;
        self.is_dark = is_dark;
        self
    }

    pub const fn background_type(&self) -> &BackgroundType {
        &self.background_type
    }

    pub const fn file_id(&self) -> Option<FileId> {
        self.file_id
    }
}

/// Names that encode a fill directly and never need a server round-trip:
/// short names, names with a `?` within the first 13 characters, and names
/// whose slug is not made of base64url characters.
pub fn is_local_background_name(name: &str) -> bool {
    if name.len() <= MAX_LOCAL_NAME_LENGTH {
        return true;
    }
    if name.find('?').is_some_and(|pos| pos <= MAX_LOCAL_NAME_LENGTH) {
        return true;
    }
    let (slug, _) = split_link(name);
    !slug.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Public share link of a background.
pub fn background_url(base_url: &str, name: &str, background_type: &BackgroundType) -> String {
    let mut url = format!("{}bg/", base_url);
    let link = background_type.link();
    if background_type.has_file() {
        url.push_str(name);
        if !link.is_empty() {
            url.push('?');
            url.push_str(&link);
        }
    } else {
        url.push_str(&link);
    }
    url
}
