//! Key/value persistence for the policy collection
//!
//! The whole collection is stored as one JSON text under a fixed key. Read
//! and write failures are logged and never surfaced: a broken store degrades
//! to an empty collection on load and to a no-op on save.

use crate::policy::{encode_policies, load_policies_from_str, sample_policies, InsurancePolicy};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key the collection is stored under
pub const STORAGE_KEY: &str = "insurancePolicies";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

/// Minimal string key/value store
pub trait KeyValueStore {
    /// Read the value for `key`; `Ok(None)` if nothing was ever stored
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StorageError {
            let path = path.to_path_buf();
            move |source| StorageError::Io { path, source }
        }

        let path = self.path_for(key)?;

        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;

        // Write beside the target and rename so a crash never leaves half a file
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value).map_err(io_err(&tmp))?;
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        Ok(())
    }
}

/// In-memory store for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with a raw value
    pub fn with_entry(key: &str, value: &str) -> Self {
        let mut store = Self::new();
        store.entries.insert(key.to_string(), value.to_string());
        store
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load the saved collection
///
/// Returns the sample policies if nothing was ever saved, and an empty
/// collection if the stored text cannot be read or decoded.
pub fn load_collection<S: KeyValueStore + ?Sized>(store: &S) -> Vec<InsurancePolicy> {
    let stored = match store.get(STORAGE_KEY) {
        Ok(stored) => stored,
        Err(e) => {
            log::error!("Failed to load policies from storage: {}", e);
            return Vec::new();
        }
    };

    let Some(text) = stored else {
        log::info!("No saved policies found, starting with sample data");
        return sample_policies();
    };

    match load_policies_from_str(&text) {
        Ok(policies) => {
            log::debug!("Loaded {} policies from storage", policies.len());
            policies
        }
        Err(e) => {
            log::error!("Failed to parse stored policies: {}", e);
            Vec::new()
        }
    }
}

/// Persist the whole collection, replacing the previous value
///
/// Returns whether the write succeeded; failures are logged only.
pub fn save_collection<S: KeyValueStore + ?Sized>(store: &mut S, policies: &[InsurancePolicy]) -> bool {
    let text = match encode_policies(policies) {
        Ok(text) => text,
        Err(e) => {
            log::error!("Failed to serialize policies: {}", e);
            return false;
        }
    };

    match store.set(STORAGE_KEY, &text) {
        Ok(()) => {
            log::debug!("Saved {} policies", policies.len());
            true
        }
        Err(e) => {
            log::error!("Failed to save policies to storage: {}", e);
            false
        }
    }
}
