//! Data-integrity violations detected on records.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A background record that breaks the model invariants.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("invalid background id {0}")]
    InvalidId(i64),

    #[error("type declares has_file={has_file} but file id present={has_file_id}")]
    FileMismatch { has_file: bool, has_file_id: bool },
}
