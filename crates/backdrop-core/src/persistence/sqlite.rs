//! SQLite-backed key-value store.

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use super::KeyValueStore;
use crate::error::{StorageError, StorageResult};

/// One logical store mapped onto one table of a SQLite database.
///
/// Several stores may share a database file; each opens its own connection.
pub struct SqliteKeyValueStore {
    conn: Arc<Mutex<Connection>>,
    table: Arc<str>,
}

impl SqliteKeyValueStore {
    pub fn open(path: &Path, table: &str) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?, table)
    }

    pub fn open_in_memory(table: &str) -> StorageResult<Self> {
        Self::init(Connection::open_in_memory()?, table)
    }

    fn init(conn: Connection, table: &str) -> StorageResult<Self> {
        // Table names can't be bound as parameters.
        if table.is_empty() || !table.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_') {
            return Err(StorageError::InvalidTable(table.to_string()));
        }

        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let _rows_affected: usize = conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    key TEXT PRIMARY KEY,
                    value BLOB NOT NULL
                )",
                table
            ),
            [],
        )?;

        Ok(Self { conn: Arc::new(Mutex::new(conn)), table: Arc::from(table) })
    }

    async fn with_connection<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &str) -> rusqlite::Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let table = Arc::clone(&self.table);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard, &table).map_err(StorageError::from)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let key = key.to_string();
        self.with_connection(move |conn, table| {
            conn.query_row(&format!("SELECT value FROM {} WHERE key = ?1", table), params![key], |row| {
                row.get::<_, Vec<u8>>(0)
            })
            .optional()
        })
        .await
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> StorageResult<()> {
        let key = key.to_string();
        self.with_connection(move |conn, table| {
            conn.execute(
                &format!(
                    "INSERT INTO {} (key, value) VALUES (?1, ?2)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                    table
                ),
                params![key, value],
            )
            .map(|_| ())
        })
        .await
    }

    async fn erase(&self, key: &str) -> StorageResult<()> {
        let key = key.to_string();
        self.with_connection(move |conn, table| {
            conn.execute(&format!("DELETE FROM {} WHERE key = ?1", table), params![key]).map(|_| ())
        })
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backdrop.sqlite");

        {
            let store = SqliteKeyValueStore::open(&path, "binlog").unwrap();
            store.set("max_bg_id", b"12".to_vec()).await.unwrap();
            store.set("max_bg_id", b"13".to_vec()).await.unwrap();
            store.set("bg", vec![2, 0x80]).await.unwrap();
            store.erase("bg").await.unwrap();
        }

        let store = SqliteKeyValueStore::open(&path, "binlog").unwrap();
        assert_eq!(store.get("max_bg_id").await.unwrap(), Some(b"13".to_vec()));
        assert!(store.get("bg").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_tables_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("backdrop.sqlite");
        let binlog = SqliteKeyValueStore::open(&path, "binlog").unwrap();
        let names = SqliteKeyValueStore::open(&path, "name_cache").unwrap();

        binlog.set("k", vec![1]).await.unwrap();
        assert!(names.get("k").await.unwrap().is_none());
    }

    #[test]
    fn test_rejects_unsafe_table_name() {
        assert!(matches!(
            SqliteKeyValueStore::open_in_memory("bg; DROP TABLE x"),
            Err(StorageError::InvalidTable(_))
        ));
    }
}
