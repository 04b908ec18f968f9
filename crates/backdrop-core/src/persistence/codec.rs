//! Versioned binary encoding of persisted background records.
//!
//! A record is `[schema_version][MessagePack map]`. Version 1 predates the
//! local identifier allocator and lacks `has_new_local_id`; it is migrated
//! on decode.

use backdrop_types::{Background, BackgroundId, BackgroundType, FileId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};

pub const SCHEMA_VERSION: u8 = 2;
const LEGACY_SCHEMA_VERSION: u8 = 1;

/// A background restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBackground {
    pub background: Background,
    /// `false` for records written before local ids were allocated durably;
    /// such fill records must be given a fresh local id.
    pub has_new_local_id: bool,
}

/// A selection slot restored from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSelection {
    pub background: Background,
    pub has_new_local_id: bool,
    /// Type the background was selected with
    pub set_type: BackgroundType,
}

#[derive(Debug, Serialize, Deserialize)]
struct BackgroundRecord {
    id: BackgroundId,
    access_hash: i64,
    name: String,
    is_creator: bool,
    is_default: bool,
    is_dark: bool,
    background_type: BackgroundType,
    file_id: Option<FileId>,
    has_new_local_id: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacyBackgroundRecord {
    id: BackgroundId,
    access_hash: i64,
    name: String,
    is_creator: bool,
    is_default: bool,
    is_dark: bool,
    background_type: BackgroundType,
    file_id: Option<FileId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct SelectionRecord {
    background: BackgroundRecord,
    set_type: BackgroundType,
}

#[derive(Debug, Serialize, Deserialize)]
struct LegacySelectionRecord {
    background: LegacyBackgroundRecord,
    set_type: BackgroundType,
}

impl From<LegacyBackgroundRecord> for BackgroundRecord {
    fn from(legacy: LegacyBackgroundRecord) -> Self {
        Self {
            id: legacy.id,
            access_hash: legacy.access_hash,
            name: legacy.name,
            is_creator: legacy.is_creator,
            is_default: legacy.is_default,
            is_dark: legacy.is_dark,
            background_type: legacy.background_type,
            file_id: legacy.file_id,
            has_new_local_id: false,
        }
    }
}

impl From<LegacySelectionRecord> for SelectionRecord {
    fn from(legacy: LegacySelectionRecord) -> Self {
        Self { background: legacy.background.into(), set_type: legacy.set_type }
    }
}

impl BackgroundRecord {
    fn from_background(background: &Background) -> Self {
        Self {
            id: background.id,
            access_hash: background.access_hash,
            name: background.name.clone(),
            is_creator: background.is_creator,
            is_default: background.is_default,
            is_dark: background.is_dark,
            background_type: background.background_type().clone(),
            file_id: background.file_id(),
            has_new_local_id: true,
        }
    }

    fn into_loaded(self) -> StorageResult<LoadedBackground> {
        let background = Background::new(self.id, self.name, self.background_type, self.file_id)?
            .with_access_hash(self.access_hash)
            .with_flags(self.is_creator, self.is_default, self.is_dark);
        Ok(LoadedBackground { background, has_new_local_id: self.has_new_local_id })
    }
}

pub fn encode_background(background: &Background) -> StorageResult<Vec<u8>> {
    encode(&BackgroundRecord::from_background(background))
}

pub fn decode_background(bytes: &[u8]) -> StorageResult<LoadedBackground> {
    decode::<BackgroundRecord, LegacyBackgroundRecord>(bytes)?.into_loaded()
}

pub fn encode_selection(background: &Background, set_type: &BackgroundType) -> StorageResult<Vec<u8>> {
    encode(&SelectionRecord {
        background: BackgroundRecord::from_background(background),
        set_type: set_type.clone(),
    })
}

pub fn decode_selection(bytes: &[u8]) -> StorageResult<LoadedSelection> {
    let record = decode::<SelectionRecord, LegacySelectionRecord>(bytes)?;
    let loaded = record.background.into_loaded()?;
    Ok(LoadedSelection {
        background: loaded.background,
        has_new_local_id: loaded.has_new_local_id,
        set_type: record.set_type,
    })
}

fn encode<T: Serialize>(record: &T) -> StorageResult<Vec<u8>> {
    let mut out = vec![SCHEMA_VERSION];
    rmp_serde::encode::write_named(&mut out, record)?;
    Ok(out)
}

fn decode<T, L>(bytes: &[u8]) -> StorageResult<T>
where
    T: DeserializeOwned,
    L: DeserializeOwned + Into<T>,
{
    let (&version, payload) = bytes.split_first().ok_or(StorageError::EmptyRecord)?;
    match version {
        SCHEMA_VERSION => Ok(rmp_serde::from_slice::<T>(payload)?),
        LEGACY_SCHEMA_VERSION => Ok(rmp_serde::from_slice::<L>(payload)?.into()),
        other => Err(StorageError::UnsupportedVersion(other)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn encode_legacy_selection(background: &Background, set_type: &BackgroundType) -> Vec<u8> {
    let legacy = LegacySelectionRecord {
        background: LegacyBackgroundRecord {
            id: background.id,
            access_hash: background.access_hash,
            name: background.name.clone(),
            is_creator: background.is_creator,
            is_default: background.is_default,
            is_dark: background.is_dark,
            background_type: background.background_type().clone(),
            file_id: background.file_id(),
        },
        set_type: set_type.clone(),
    };
    let mut out = vec![LEGACY_SCHEMA_VERSION];
    rmp_serde::encode::write_named(&mut out, &legacy).unwrap();
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use backdrop_types::{BackgroundFill, IntegrityError};

    fn pattern_background() -> Background {
        let pattern = BackgroundType::pattern(BackgroundFill::gradient(0x112233, 0x445566, 135).unwrap(), -40, true).unwrap();
        Background::new(BackgroundId::new(1 << 40), "AbCdEfGhIjKlMnOp", pattern, Some(FileId::new(77)))
            .unwrap()
            .with_access_hash(-991)
            .with_flags(false, true, true)
    }

    #[test]
    fn test_background_round_trip() {
        let background = pattern_background();
        let bytes = encode_background(&background).unwrap();
        assert_eq!(bytes[0], SCHEMA_VERSION);

        let loaded = decode_background(&bytes).unwrap();
        assert_eq!(loaded.background, background);
        assert!(loaded.has_new_local_id);
    }

    #[test]
    fn test_selection_keeps_set_type() {
        let background = pattern_background();
        let set_type = BackgroundType::pattern(BackgroundFill::solid(0xFFFFFF).unwrap(), 10, false).unwrap();
        let loaded = decode_selection(&encode_selection(&background, &set_type).unwrap()).unwrap();
        assert_eq!(loaded.background, background);
        assert_eq!(loaded.set_type, set_type);
    }

    #[test]
    fn test_legacy_record_is_migrated() {
        let fill = BackgroundType::fill(BackgroundFill::solid(0x00FF00).unwrap());
        let background = Background::local_fill(BackgroundId::new(3), fill.clone(), false, false).unwrap();

        let loaded = decode_selection(&encode_legacy_selection(&background, &fill)).unwrap();
        assert!(!loaded.has_new_local_id);
        assert_eq!(loaded.background, background);
    }

    #[test]
    fn test_file_presence_mismatch_is_rejected() {
        let record = BackgroundRecord {
            id: BackgroundId::new(1 << 40),
            access_hash: 0,
            name: "AbCdEfGhIjKlMnOp".to_string(),
            is_creator: false,
            is_default: false,
            is_dark: false,
            background_type: BackgroundType::wallpaper(false, false),
            file_id: None,
            has_new_local_id: true,
        };
        let bytes = encode(&record).unwrap();
        assert!(matches!(
            decode_background(&bytes),
            Err(StorageError::Integrity(IntegrityError::FileMismatch { has_file: true, has_file_id: false }))
        ));
    }

    #[test]
    fn test_malformed_records_are_rejected() {
        assert!(matches!(decode_background(&[]), Err(StorageError::EmptyRecord)));
        assert!(matches!(decode_background(&[7, 0x80]), Err(StorageError::UnsupportedVersion(7))));
        assert!(matches!(decode_background(&[SCHEMA_VERSION, 0xC1]), Err(StorageError::Decode(_))));
    }
}
