//! Durable storage for the settings record.
//!
//! The stream treats its store as a plain key/value map of opaque bytes.
//! Only the stream writes its own key, so there is no read-modify-write
//! contention to handle here.

use bytes::Bytes;
use dashmap::DashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key cannot be used by this store.
    #[error("Invalid store key: {0}")]
    InvalidKey(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Synchronous key/value persistence.
pub trait SettingsStore: Send + Sync {
    /// Save `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value could not be written.
    fn save(&self, key: &str, value: Bytes) -> Result<(), StoreError>;

    /// Load the value saved under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store could not be read.
    fn load(&self, key: &str) -> Result<Option<Bytes>, StoreError>;
}

/// In-process store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, Bytes>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsStore for MemoryStore {
    fn save(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        trace!(key = %key, bytes = value.len(), "Saving to memory store");
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }
}

/// Store keeping one file per key in a directory.
///
/// Writes land in a temporary sibling first, are synced to disk and renamed
/// into place, so a reader never sees a partially written record.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Get the root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(key))
    }
}

impl SettingsStore for FileStore {
    fn save(&self, key: &str, value: Bytes) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let tmp = self.dir.join(format!(".{}.tmp", key));

        fs::create_dir_all(&self.dir)?;
        let mut file = File::create(&tmp)?;
        file.write_all(&value)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &path)?;

        debug!(path = %path.display(), bytes = value.len(), "Saved record");
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Bytes>, StoreError> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
