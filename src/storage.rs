use crate::error::Result;
use log::{debug, warn};
use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        debug!("Opened storage at {}", db_path);
        Ok(Storage { conn })
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare("SELECT key FROM kv ORDER BY key")?;
        let keys = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }
}

impl KeyValueStore for Storage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let value = stmt
            .query_row([key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

pub(crate) fn read_list<S, T>(store: &S, key: &str) -> Vec<T>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    try_read_list(store, key).unwrap_or_else(|e| {
        warn!("Failed to read {}: {}", key, e);
        Vec::new()
    })
}

// Read-modify-write paths must use this: a failed read must not become an empty list that gets written back.
pub(crate) fn try_read_list<S, T>(store: &S, key: &str) -> Result<Vec<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(values) => Ok(values),
        Err(e) => {
            warn!("Ignoring malformed value under {}: {}", key, e);
            Ok(Vec::new())
        }
    }
}

pub(crate) fn write_list<S, T>(store: &S, key: &str, values: &[T]) -> Result<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize,
{
    let raw = serde_json::to_string(values)?;
    store.set(key, &raw)
}


#[cfg(test)]
mod tests {
    use super::*;

    fn setup_in_memory_db() -> Storage {
        Storage::new(":memory:").unwrap()
    }

    #[test]
    fn test_set_and_get() {
        let storage = setup_in_memory_db();
        storage.set("user", "{\"id\":\"123\"}").unwrap();
        assert_eq!(storage.get("user").unwrap().as_deref(), Some("{\"id\":\"123\"}"));
    }

    #[test]
    fn test_set_overwrites() {
        let storage = setup_in_memory_db();
        storage.set("found_items", "[]").unwrap();
        storage.set("found_items", "[1]").unwrap();
        assert_eq!(storage.get("found_items").unwrap().as_deref(), Some("[1]"));
        assert_eq!(storage.keys().unwrap(), vec!["found_items".to_string()]);
    }

    #[test]
    fn test_get_missing_key() {
        let storage = setup_in_memory_db();
        assert_eq!(storage.get("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let storage = setup_in_memory_db();
        storage.set("lost_items", "[]").unwrap();
        storage.remove("lost_items").unwrap();
        storage.remove("lost_items").unwrap();
        assert_eq!(storage.get("lost_items").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.db");
        let path = path.to_str().unwrap();
        {
            let storage = Storage::new(path).unwrap();
            storage.set("user", "saved").unwrap();
        }
        let storage = Storage::new(path).unwrap();
        assert_eq!(storage.get("user").unwrap().as_deref(), Some("saved"));
    }

    #[test]
    fn test_read_list_treats_garbage_as_empty() {
        let storage = MemoryStorage::new();
        storage.set("found_items", "{not json").unwrap();
        let values: Vec<u32> = read_list(&storage, "found_items");
        assert!(values.is_empty());

        write_list(&storage, "found_items", &[1u32, 2, 3]).unwrap();
        let values: Vec<u32> = read_list(&storage, "found_items");
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_try_read_list_surfaces_backend_failure() {
        let storage = testing::FlakyStorage::default();
        write_list(&storage, "found_items", &[1u32, 2]).unwrap();
        storage.fail_reads.set(true);

        let result: Result<Vec<u32>> = try_read_list(&storage, "found_items");
        assert!(matches!(result, Err(crate::Error::Storage(_))));
        let values: Vec<u32> = read_list(&storage, "found_items");
        assert!(values.is_empty());

        storage.fail_reads.set(false);
        let values: Vec<u32> = try_read_list(&storage, "found_items").unwrap();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_memory_storage_through_rc() {
        let shared = Rc::new(MemoryStorage::new());
        let other = Rc::clone(&shared);
        shared.set("chats", "[]").unwrap();
        assert_eq!(other.get("chats").unwrap().as_deref(), Some("[]"));
        other.remove("chats").unwrap();
        assert_eq!(shared.get("chats").unwrap(), None);
    }
}
