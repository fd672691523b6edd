//! Local persistence
//!
//! A small key/value store backed by one JSON file. Every mutation is written
//! through to disk. Typed accessors for autosaved answers, the collapsed
//! section list and the offline outbox live in the submodules.

mod autosave;
mod outbox;

pub use outbox::OutboxEntry;

#[cfg(test)]
pub use autosave::{FORM_DATA_KEY, FORM_TIMESTAMP_KEY};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// File name of the store inside the data directory
pub const STORE_FILE: &str = "local_storage.json";

/// Store shared between the UI loop and submission tasks
pub type SharedStore = Arc<Mutex<LocalStore>>;

/// Lock a shared store, recovering from a poisoned lock
pub fn lock(store: &SharedStore) -> MutexGuard<'_, LocalStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{path} is not a JSON object: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("value under `{key}` has an unexpected shape: {source}")]
    Value {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// JSON-file key/value store
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    /// `None` keeps everything in memory
    path: Option<PathBuf>,
    data: Map<String, Value>,
    /// Writes allowed before every flush fails
    #[cfg(test)]
    write_budget: std::cell::Cell<Option<usize>>,
}

impl LocalStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => Map::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };
        tracing::debug!(path = %path.display(), keys = data.len(), "Opened local store");
        Ok(Self {
            path: Some(path),
            data,
            #[cfg(test)]
            write_budget: Default::default(),
        })
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn into_shared(self) -> SharedStore {
        Arc::new(Mutex::new(self))
    }

    /// Let `writes` more flushes succeed, then fail the rest
    #[cfg(test)]
    pub fn fail_writes_after(&self, writes: usize) {
        self.write_budget.set(Some(writes));
    }

    #[cfg(test)]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[cfg(test)]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    #[cfg(test)]
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Decode the value under `key`
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        self.data
            .get(key)
            .map(|value| {
                serde_json::from_value(value.clone()).map_err(|source| StorageError::Value {
                    key: key.to_string(),
                    source,
                })
            })
            .transpose()
    }

    pub fn set<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let value = serde_json::to_value(value).map_err(|source| StorageError::Value {
            key: key.to_string(),
            source,
        })?;
        self.data.insert(key.to_string(), value);
        self.flush()
    }

    pub fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.data.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    /// Remove several keys with a single write
    pub fn remove_all(&mut self, keys: &[&str]) -> Result<(), StorageError> {
        let removed = keys
            .iter()
            .fold(false, |any, key| self.data.remove(*key).is_some() || any);
        if removed {
            self.flush()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), StorageError> {
        #[cfg(test)]
        if let Some(left) = self.write_budget.get() {
            if left == 0 {
                return Err(StorageError::Io {
                    path: self.path.clone().unwrap_or_default(),
                    source: io::Error::other("write budget spent"),
                });
            }
            self.write_budget.set(Some(left - 1));
        }
        let Some(path) = &self.path else {
            return Ok(());
        };
        let io_err = |source: io::Error| StorageError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(&self.data).map_err(|source| {
            StorageError::Corrupt {
                path: path.clone(),
                source,
            }
        })?;
        // Write then rename; readers never see a partial file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }
}
