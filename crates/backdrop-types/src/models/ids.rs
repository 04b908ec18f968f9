//! Identifier newtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound (inclusive) of the locally-allocated identifier range.
pub const MAX_LOCAL_BACKGROUND_ID: i64 = 0x7FFF_FFFF;

/// Background identifier.
///
/// Zero is the invalid identifier. Values in `1..=MAX_LOCAL_BACKGROUND_ID`
/// are allocated on this device and never sent to the server; every other
/// non-zero value is assigned by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackgroundId(i64);

impl BackgroundId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    pub const fn is_local(self) -> bool {
        self.0 > 0 && self.0 <= MAX_LOCAL_BACKGROUND_ID
    }

    /// Valid and outside the local range.
    pub const fn is_remote(self) -> bool {
        self.is_valid() && !self.is_local()
    }
}

impl fmt::Display for BackgroundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "background {}", self.0)
    }
}

/// Handle of a file owned by the external file subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

impl FileId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file {}", self.0)
    }
}

/// Handle issued by the reference-tracking subsystem for one background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSourceId(u64);

impl ReferenceSourceId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ranges_are_disjoint() {
        assert!(!BackgroundId::new(0).is_valid());
        assert!(BackgroundId::new(1).is_local());
        assert!(BackgroundId::new(MAX_LOCAL_BACKGROUND_ID).is_local());
        assert!(BackgroundId::new(MAX_LOCAL_BACKGROUND_ID + 1).is_remote());
        assert!(BackgroundId::new(-5).is_remote());
        assert!(!BackgroundId::new(7).is_remote());
    }
}
