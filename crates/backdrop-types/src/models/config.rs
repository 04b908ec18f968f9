//! Manager configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration of the background manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ManagerConfig {
    /// Keep resolved-by-name backgrounds in the durable by-slug cache
    pub use_file_database: bool,
    /// Bot identities receive no selection updates
    pub is_bot: bool,
    /// Prefix of public background links, ending with `/`
    pub link_base_url: String,
    /// SQLite file holding the durable stores (in-memory when absent)
    pub database_path: Option<PathBuf>,
}

impl ManagerConfig {
    /// Create default configuration.
    pub fn new() -> Self {
        Self {
            use_file_database: true,
            is_bot: false,
            link_base_url: "https://t.me/".to_string(),
            database_path: None,
        }
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self::new()
    }
}
