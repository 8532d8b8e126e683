//! JSONL-based storage implementation with in-memory caching.
//!
//! One `<collection>.jsonl` file per collection. Creates append; updates and
//! deletes rewrite the file from the cache.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Serialize, de::DeserializeOwned};

use super::traits::{Filter, HasId, Storage};
use crate::error::{Result, TaskrankError};

type Cache = HashMap<String, Vec<serde_json::Value>>;

/// JSONL-based storage with in-memory caching.
pub struct JsonlStorage {
    base_path: PathBuf,
    cache: RwLock<Cache>,
}

impl std::fmt::Debug for JsonlStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonlStorage")
            .field("base_path", &self.base_path)
            .finish_non_exhaustive()
    }
}

fn lock_error(e: impl std::fmt::Display) -> TaskrankError {
    TaskrankError::Storage(e.to_string())
}

fn not_loaded(collection: &str) -> TaskrankError {
    TaskrankError::Storage(format!("Collection not loaded: {}", collection))
}

fn record_id(record: &serde_json::Value) -> Option<&str> {
    record.get("id").and_then(|v| v.as_str())
}

impl JsonlStorage {
    /// Create a new JsonlStorage at the given path.
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        log::debug!("Opened JSONL storage at {}", base_path.display());
        Ok(Self {
            base_path,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.base_path.join(format!("{}.jsonl", collection))
    }

    /// Load a collection into cache if not already loaded.
    fn ensure_loaded(&self, collection: &str) -> Result<()> {
        {
            let cache = self.cache.read().map_err(lock_error)?;
            if cache.contains_key(collection) {
                return Ok(());
            }
        }

        let mut cache = self.cache.write().map_err(lock_error)?;
        if cache.contains_key(collection) {
            return Ok(());
        }

        let path = self.collection_path(collection);
        let mut records = Vec::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for line in reader.lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    records.push(serde_json::from_str(&line)?);
                }
            }
        }

        log::debug!("Loaded {} records from {}", records.len(), path.display());
        cache.insert(collection.to_string(), records);
        Ok(())
    }

    fn append_to_file(&self, collection: &str, record: &serde_json::Value) -> Result<()> {
        let path = self.collection_path(collection);
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }

    /// Swap `value` into `records[index]` and persist. The cache keeps the
    /// old record if the file write fails.
    fn replace_and_persist(
        &self,
        collection: &str,
        records: &mut [serde_json::Value],
        index: usize,
        value: serde_json::Value,
    ) -> Result<()> {
        let previous = std::mem::replace(&mut records[index], value);
        if let Err(e) = self.rewrite_file(collection, records) {
            records[index] = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Rewrite the whole collection file; caller holds the cache lock.
    fn rewrite_file(&self, collection: &str, records: &[serde_json::Value]) -> Result<()> {
        let path = self.collection_path(collection);
        let mut file = File::create(&path)?;
        for record in records {
            writeln!(file, "{}", serde_json::to_string(record)?)?;
        }
        Ok(())
    }
}

impl Storage for JsonlStorage {
    fn create<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, record: &T) -> Result<()> {
        self.ensure_loaded(collection)?;

        let value = serde_json::to_value(record)?;
        let mut cache = self.cache.write().map_err(lock_error)?;
        let records = cache.get_mut(collection).ok_or_else(|| not_loaded(collection))?;

        if records.iter().any(|r| record_id(r) == Some(record.id())) {
            return Err(TaskrankError::Storage(format!(
                "Duplicate id {} in {}",
                record.id(),
                collection
            )));
        }

        // File first, it is the source of truth
        self.append_to_file(collection, &value)?;
        records.push(value);
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        self.ensure_loaded(collection)?;

        let cache = self.cache.read().map_err(lock_error)?;
        let records = cache.get(collection).ok_or_else(|| not_loaded(collection))?;

        records
            .iter()
            .find(|r| record_id(r) == Some(id))
            .map(|r| serde_json::from_value(r.clone()))
            .transpose()
            .map_err(TaskrankError::from)
    }

    fn update<T: Serialize + DeserializeOwned + HasId>(&self, collection: &str, id: &str, record: &T) -> Result<()> {
        self.ensure_loaded(collection)?;

        let value = serde_json::to_value(record)?;
        let mut cache = self.cache.write().map_err(lock_error)?;
        let records = cache.get_mut(collection).ok_or_else(|| not_loaded(collection))?;

        let index = records
            .iter()
            .position(|r| record_id(r) == Some(id))
            .ok_or_else(|| TaskrankError::TaskNotFound(id.to_string()))?;

        self.replace_and_persist(collection, records, index, value)
    }

    fn update_with<T, F>(&self, collection: &str, id: &str, f: F) -> Result<bool>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> bool,
    {
        self.ensure_loaded(collection)?;

        let mut cache = self.cache.write().map_err(lock_error)?;
        let records = cache.get_mut(collection).ok_or_else(|| not_loaded(collection))?;

        let Some(index) = records.iter().position(|r| record_id(r) == Some(id)) else {
            return Ok(false);
        };

        let mut record: T = serde_json::from_value(records[index].clone())?;
        if !f(&mut record) {
            return Ok(false);
        }
        let value = serde_json::to_value(&record)?;

        self.replace_and_persist(collection, records, index, value)?;
        Ok(true)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<()> {
        self.ensure_loaded(collection)?;

        let mut cache = self.cache.write().map_err(lock_error)?;
        let records = cache.get_mut(collection).ok_or_else(|| not_loaded(collection))?;

        let index = records
            .iter()
            .position(|r| record_id(r) == Some(id))
            .ok_or_else(|| TaskrankError::TaskNotFound(id.to_string()))?;

        let removed = records.remove(index);
        if let Err(e) = self.rewrite_file(collection, records) {
            records.insert(index, removed);
            return Err(e);
        }
        Ok(())
    }

    fn query<T: DeserializeOwned>(&self, collection: &str, filters: &[Filter]) -> Result<Vec<T>> {
        self.ensure_loaded(collection)?;

        let cache = self.cache.read().map_err(lock_error)?;
        let records = cache.get(collection).ok_or_else(|| not_loaded(collection))?;

        records
            .iter()
            .filter(|r| filters.iter().all(|f| f.matches(r)))
            .map(|r| serde_json::from_value(r.clone()).map_err(TaskrankError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: String,
        body: String,
        pinned: bool,
    }

    impl HasId for Note {
        fn id(&self) -> &str {
            &self.id
        }
    }

    fn note(id: &str, body: &str, pinned: bool) -> Note {
        Note {
            id: id.to_string(),
            body: body.to_string(),
            pinned,
        }
    }

    fn create_test_storage() -> (JsonlStorage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let storage = JsonlStorage::new(temp_dir.path()).unwrap();
        (storage, temp_dir)
    }

    #[test]
    fn test_create_and_get() {
        let (storage, _temp) = create_test_storage();
        let record = note("1", "milk", false);

        storage.create("notes", &record).unwrap();
        let retrieved: Option<Note> = storage.get("notes", "1").unwrap();

        assert_eq!(retrieved, Some(record));
    }

    #[test]
    fn test_get_not_found() {
        let (storage, _temp) = create_test_storage();
        let retrieved: Option<Note> = storage.get("notes", "nonexistent").unwrap();
        assert_eq!(retrieved, None);
    }

    #[test]
    fn test_create_rejects_duplicate_id() {
        let (storage, _temp) = create_test_storage();
        storage.create("notes", &note("1", "a", false)).unwrap();
        assert!(storage.create("notes", &note("1", "b", false)).is_err());
    }

    #[test]
    fn test_update() {
        let (storage, _temp) = create_test_storage();
        storage.create("notes", &note("1", "milk", false)).unwrap();

        let updated = note("1", "oat milk", true);
        storage.update("notes", "1", &updated).unwrap();

        let retrieved: Option<Note> = storage.get("notes", "1").unwrap();
        assert_eq!(retrieved, Some(updated));
    }

    #[test]
    fn test_update_not_found() {
        let (storage, _temp) = create_test_storage();
        let result = storage.update("notes", "1", &note("1", "x", false));
        assert!(matches!(result, Err(TaskrankError::TaskNotFound(_))));
    }

    #[test]
    fn test_update_with_applies_change() {
        let (storage, _temp) = create_test_storage();
        storage.create("notes", &note("1", "milk", false)).unwrap();

        let changed = storage
            .update_with("notes", "1", |n: &mut Note| {
                n.pinned = true;
                true
            })
            .unwrap();

        assert!(changed);
        let retrieved: Note = storage.get("notes", "1").unwrap().unwrap();
        assert!(retrieved.pinned);
    }

    #[test]
    fn test_update_with_declined_writes_nothing() {
        let (storage, temp) = create_test_storage();
        storage.create("notes", &note("1", "milk", false)).unwrap();

        let changed = storage
            .update_with("notes", "1", |n: &mut Note| {
                n.body = "ignored".to_string();
                false
            })
            .unwrap();

        assert!(!changed);
        let reloaded = JsonlStorage::new(temp.path()).unwrap();
        let retrieved: Note = reloaded.get("notes", "1").unwrap().unwrap();
        assert_eq!(retrieved.body, "milk");
    }

    #[test]
    fn test_update_with_missing_record() {
        let (storage, _temp) = create_test_storage();
        let changed = storage.update_with("notes", "ghost", |_: &mut Note| true).unwrap();
        assert!(!changed);
    }

    #[test]
    fn test_delete() {
        let (storage, _temp) = create_test_storage();
        storage.create("notes", &note("1", "milk", false)).unwrap();
        storage.delete("notes", "1").unwrap();

        let retrieved: Option<Note> = storage.get("notes", "1").unwrap();
        assert_eq!(retrieved, None);
    }

    #[test]
    fn test_delete_not_found() {
        let (storage, _temp) = create_test_storage();
        assert!(storage.delete("notes", "nonexistent").is_err());
    }

    /// Replace the collection file with a directory so every rewrite fails
    fn break_collection_file(temp: &TempDir, collection: &str) {
        let path = temp.path().join(format!("{}.jsonl", collection));
        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();
    }

    #[test]
    fn test_failed_write_leaves_cache_unchanged() {
        let (storage, temp) = create_test_storage();
        storage.create("notes", &note("1", "milk", false)).unwrap();
        storage.create("notes", &note("2", "eggs", false)).unwrap();
        break_collection_file(&temp, "notes");

        let result = storage.update_with("notes", "1", |n: &mut Note| {
            n.pinned = true;
            true
        });
        assert!(result.is_err());
        assert!(storage.update("notes", "1", &note("1", "oat milk", true)).is_err());
        assert!(storage.delete("notes", "2").is_err());

        let first: Note = storage.get("notes", "1").unwrap().unwrap();
        assert_eq!(first, note("1", "milk", false));
        let all: Vec<Note> = storage.list("notes").unwrap();
        assert_eq!(all, vec![note("1", "milk", false), note("2", "eggs", false)]);
    }

    #[test]
    fn test_query_with_filters() {
        let (storage, _temp) = create_test_storage();
        storage.create("notes", &note("1", "a", true)).unwrap();
        storage.create("notes", &note("2", "b", false)).unwrap();
        storage.create("notes", &note("3", "c", true)).unwrap();

        let pinned: Vec<Note> = storage.query("notes", &[Filter::eq("pinned", true)]).unwrap();

        assert_eq!(pinned.len(), 2);
        assert!(pinned.iter().all(|n| n.pinned));
    }

    #[test]
    fn test_persistence_across_instances() {
        let temp_dir = TempDir::new().unwrap();

        {
            let storage = JsonlStorage::new(temp_dir.path()).unwrap();
            storage.create("notes", &note("1", "milk", false)).unwrap();
            storage
                .update_with("notes", "1", |n: &mut Note| {
                    n.pinned = true;
                    true
                })
                .unwrap();
        }

        {
            let storage = JsonlStorage::new(temp_dir.path()).unwrap();
            let retrieved: Note = storage.get("notes", "1").unwrap().unwrap();
            assert_eq!(retrieved.body, "milk");
            assert!(retrieved.pinned);
        }
    }

    #[test]
    fn test_empty_collection() {
        let (storage, _temp) = create_test_storage();
        let all: Vec<Note> = storage.list("empty").unwrap();
        assert!(all.is_empty());
    }

    #[test]
    fn test_multiple_collections() {
        let (storage, _temp) = create_test_storage();
        storage.create("inbox", &note("1", "in_inbox", false)).unwrap();
        storage.create("archive", &note("1", "in_archive", false)).unwrap();

        let a: Note = storage.get("inbox", "1").unwrap().unwrap();
        let b: Note = storage.get("archive", "1").unwrap().unwrap();

        assert_eq!(a.body, "in_inbox");
        assert_eq!(b.body, "in_archive");
    }
}
