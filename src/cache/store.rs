// Local key-value storage backing the cache manager.
//
// Values are opaque strings. `FileStore` persists the whole map as one JSON
// object and rewrites it through a temp file + rename on every mutation.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("storage lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Returns whether the key existed.
    fn remove(&self, key: &str) -> Result<bool, StorageError>;

    /// Stores `value` only if `key` is absent, atomically with respect to
    /// other writers of this store. Returns the value held after the call.
    fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StorageError>;

    /// Removes every listed key, returning how many existed.
    fn remove_many(&self, keys: &[String]) -> Result<usize, StorageError> {
        let mut removed = 0;
        for key in keys {
            if self.remove(key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Process-local store, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.iter().map(|e| e.key().clone()).collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StorageError> {
        match self.entries.entry(key.to_string()) {
            Entry::Occupied(e) => Ok(e.get().clone()),
            Entry::Vacant(e) => {
                e.insert(value.to_string());
                Ok(value.to_string())
            }
        }
    }
}

/// JSON-file store persisted across sessions.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        info!("Opened cache store {} ({} entries)", path.display(), entries.len());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>, StorageError> {
        self.entries.lock().map_err(|_| StorageError::Poisoned)
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(entries)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Persisted {} cache entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Applies `change` to a copy of the map and swaps it in only once the
    /// copy is on disk. A failed write leaves memory matching the file.
    fn mutate<T>(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) -> (T, bool),
    ) -> Result<T, StorageError> {
        let mut entries = self.lock()?;
        let mut next = entries.clone();
        let (out, dirty) = change(&mut next);
        if dirty {
            self.persist(&next)?;
            *entries = next;
        }
        Ok(out)
    }
}

impl KeyValueStore for FileStore {
    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
            ((), true)
        })
    }

    fn remove(&self, key: &str) -> Result<bool, StorageError> {
        self.mutate(|entries| {
            let existed = entries.remove(key).is_some();
            (existed, existed)
        })
    }

    fn set_if_absent(&self, key: &str, value: &str) -> Result<String, StorageError> {
        self.mutate(|entries| match entries.get(key) {
            Some(existing) => (existing.clone(), false),
            None => {
                entries.insert(key.to_string(), value.to_string());
                (value.to_string(), true)
            }
        })
    }

    fn remove_many(&self, keys: &[String]) -> Result<usize, StorageError> {
        self.mutate(|entries| {
            let removed = keys.iter().filter(|k| entries.remove(k.as_str()).is_some()).count();
            (removed, removed > 0)
        })
    }
}
