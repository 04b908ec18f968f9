//! Durable allocator of local background identifiers.

use backdrop_types::{BackgroundId, MAX_LOCAL_BACKGROUND_ID};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};
use crate::persistence::{KeyValueStore, MAX_LOCAL_ID_KEY};

/// Hands out identifiers in the local range, strictly increasing across
/// restarts.
///
/// The high-water mark is persisted before a new identifier is returned, so
/// a crash can waste identifiers but never reissue one.
pub struct LocalIdAllocator {
    store: Arc<dyn KeyValueStore>,
    max_local_id: i64,
}

impl LocalIdAllocator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store, max_local_id: 0 }
    }

    pub const fn max_local_id(&self) -> i64 {
        self.max_local_id
    }

    /// Restore the high-water mark. A missing counter starts from zero.
    pub async fn load(&mut self) -> StorageResult<()> {
        let Some(bytes) = self.store.get(MAX_LOCAL_ID_KEY).await? else {
            self.max_local_id = 0;
            return Ok(());
        };
        let text = String::from_utf8_lossy(&bytes);
        let value = text.trim().parse::<i64>().map_err(|_| StorageError::InvalidCounter(text.to_string()))?;
        if !(0..=MAX_LOCAL_BACKGROUND_ID).contains(&value) {
            return Err(StorageError::InvalidCounter(text.to_string()));
        }
        self.max_local_id = value;
        debug!(max_local_id = value, "Loaded local background id counter");
        Ok(())
    }

    /// Next identifier, persisted before it is returned.
    pub async fn next_local_id(&mut self) -> StorageResult<BackgroundId> {
        if self.max_local_id >= MAX_LOCAL_BACKGROUND_ID {
            warn!("Local background id range exhausted");
            return Err(StorageError::IdRangeExhausted);
        }
        let next = self.max_local_id + 1;
        self.persist(next).await?;
        self.max_local_id = next;
        Ok(BackgroundId::new(next))
    }

    /// Make sure `id` is never handed out again.
    pub async fn raise_to(&mut self, id: BackgroundId) -> StorageResult<()> {
        if !id.is_local() || id.get() <= self.max_local_id {
            return Ok(());
        }
        self.persist(id.get()).await?;
        self.max_local_id = id.get();
        Ok(())
    }

    async fn persist(&self, value: i64) -> StorageResult<()> {
        self.store.set(MAX_LOCAL_ID_KEY, value.to_string().into_bytes()).await
    }
}
