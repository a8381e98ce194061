//! SQLite-backed key-value store for persisted settings.
//!
//! Values are JSON documents stored as text in a single `kv` table.

use std::path::Path;

use rusqlite::{params, Connection};
use serde_json::Value;

use super::{data_dir, SettingsStore};
use crate::error::{CoreError, StorageError};

pub struct KvStore {
    conn: Connection,
}

impl KvStore {
    /// Open the store at `<data_dir>/roundbell.db`.
    ///
    /// # Errors
    /// Returns an error if the data directory is unusable or the database
    /// cannot be opened or migrated.
    pub fn open_default() -> Result<Self, CoreError> {
        let path = data_dir()?.join("roundbell.db");
        Ok(Self::open(&path)?)
    }

    /// Open (creating if needed) the store at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if SQLite cannot allocate the database.
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )
    }

    /// Raw text stored under `key`.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl SettingsStore for KvStore {
    fn load(&self, key: &str) -> Option<Value> {
        let raw = match self.kv_get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to load setting");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, error = %e, "stored setting is not valid JSON");
                None
            }
        }
    }

    fn save(&mut self, key: &str, value: &Value) {
        if let Err(e) = self.kv_set(key, &value.to_string()) {
            tracing::warn!(key, error = %e, "failed to save setting");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kv_roundtrip() {
        let store = KvStore::open_memory().unwrap();
        assert!(store.kv_get("test").unwrap().is_none());
        store.kv_set("test", "hello").unwrap();
        assert_eq!(store.kv_get("test").unwrap().unwrap(), "hello");
        store.kv_set("test", "again").unwrap();
        assert_eq!(store.kv_get("test").unwrap().unwrap(), "again");
    }

    #[test]
    fn settings_store_parses_json() {
        let mut store = KvStore::open_memory().unwrap();
        store.save("roundbell.v1.combos", &json!(["1-2", "3-4"]));
        assert_eq!(store.load("roundbell.v1.combos"), Some(json!(["1-2", "3-4"])));
        assert_eq!(store.load("missing"), None);
    }

    #[test]
    fn corrupt_value_loads_as_none() {
        let store = KvStore::open_memory().unwrap();
        store.kv_set("roundbell.v1.settings", "{not json").unwrap();
        assert_eq!(store.load("roundbell.v1.settings"), None);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("roundbell.db");
        {
            let mut store = KvStore::open(&path).unwrap();
            store.save("k", &json!({"rounds": 4}));
        }
        let store = KvStore::open(&path).unwrap();
        assert_eq!(store.load("k"), Some(json!({"rounds": 4})));
    }
}
