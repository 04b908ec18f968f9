//! Durable state of the manager.
//!
//! Two logical stores: the binlog store holds the allocator counter and the
//! two selection slots; the optional name cache maps slugs to backgrounds
//! resolved from the server.
//!
//! | Store      | Key            | Value                         |
//! |------------|----------------|-------------------------------|
//! | binlog     | `max_bg_id`    | decimal counter               |
//! | binlog     | `bg` / `bgd`   | selection record (light/dark) |
//! | name cache | `bgn` + slug   | background record             |

pub mod codec;
mod memory;
mod sqlite;

pub use codec::{LoadedBackground, LoadedSelection};
pub use memory::MemoryKeyValueStore;
pub use sqlite::SqliteKeyValueStore;

use async_trait::async_trait;
use backdrop_types::{Background, BackgroundType, ManagerConfig};
use std::sync::Arc;

use crate::error::StorageResult;

pub const MAX_LOCAL_ID_KEY: &str = "max_bg_id";
const BINLOG_TABLE: &str = "binlog";
const NAME_CACHE_TABLE: &str = "name_cache";

/// Async key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()>;

    async fn erase(&self, key: &str) -> StorageResult<()>;
}

pub fn selection_key(for_dark_theme: bool) -> &'static str {
    if for_dark_theme {
        "bgd"
    } else {
        "bg"
    }
}

pub fn name_key(slug: &str) -> String {
    format!("bgn{}", slug)
}

/// Open the SQLite stores described by `config`: the database file when a
/// path is configured, a private in-memory database otherwise. The name
/// cache is only opened when `use_file_database` is set.
pub fn open_stores(config: &ManagerConfig) -> StorageResult<(Arc<dyn KeyValueStore>, Option<Arc<dyn KeyValueStore>>)> {
    let open = |table: &str| match &config.database_path {
        Some(path) => SqliteKeyValueStore::open(path, table),
        None => SqliteKeyValueStore::open_in_memory(table),
    };

    let binlog: Arc<dyn KeyValueStore> = Arc::new(open(BINLOG_TABLE)?);
    let name_cache = if config.use_file_database {
        Some(Arc::new(open(NAME_CACHE_TABLE)?) as Arc<dyn KeyValueStore>)
    } else {
        None
    };
    Ok((binlog, name_cache))
}

/// Typed access to the selection slots and the name cache.
#[derive(Clone)]
pub struct PersistenceAdapter {
    binlog: Arc<dyn KeyValueStore>,
    name_cache: Option<Arc<dyn KeyValueStore>>,
}

impl PersistenceAdapter {
    pub fn new(binlog: Arc<dyn KeyValueStore>, name_cache: Option<Arc<dyn KeyValueStore>>) -> Self {
        Self { binlog, name_cache }
    }

    pub fn binlog(&self) -> Arc<dyn KeyValueStore> {
        Arc::clone(&self.binlog)
    }

    pub fn name_cache(&self) -> Option<Arc<dyn KeyValueStore>> {
        self.name_cache.clone()
    }

    /// `Ok(None)` for an empty slot; decode failures are reported as errors
    /// so the caller can clear the slot.
    pub async fn load_selection(&self, for_dark_theme: bool) -> StorageResult<Option<LoadedSelection>> {
        match self.binlog.get(selection_key(for_dark_theme)).await? {
            Some(bytes) => codec::decode_selection(&bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Write a slot, or erase it when `selection` is `None`.
    pub async fn save_selection(
        &self,
        for_dark_theme: bool,
        selection: Option<(&Background, &BackgroundType)>,
    ) -> StorageResult<()> {
        let key = selection_key(for_dark_theme);
        match selection {
            Some((background, set_type)) => {
                let bytes = codec::encode_selection(background, set_type)?;
                self.binlog.set(key, bytes).await
            },
            None => self.binlog.erase(key).await,
        }
    }

    /// Write a resolved background to the name cache without waiting for
    /// the store. Failures are logged.
    pub fn save_by_name_detached(&self, background: &Background) {
        let Some(store) = self.name_cache() else {
            return;
        };
        let bytes = match codec::encode_background(background) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(background_id = %background.id, "Failed to encode background: {}", e);
                return;
            },
        };
        let key = name_key(&background.name);
        tokio::spawn(async move {
            if let Err(e) = store.set(&key, bytes).await {
                tracing::warn!(key = %key, "Failed to save background by name: {}", e);
            }
        });
    }
}
