//! Durable key/value byte storage behind the gallery.
//!
//! The gallery only needs to get and set one byte blob by string key, with
//! no partially written value ever visible to a reader. [`KeyValueStore`] is
//! that contract; [`MemoryStore`] backs tests and ephemeral sessions and
//! [`FileStore`] persists each key as one file, replaced atomically.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::StoreError;

/// A durable map from string keys to byte blobs.
///
/// `set` must replace the whole value atomically: a concurrent or later
/// `get` sees either the previous value or the new one, never a mix.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

// ============================================================================
// MemoryStore
// ============================================================================

/// In-process store; values live as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a value, e.g. a blob written by an older version.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.lock().insert(key.into(), value.into());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // Inserts replace whole values, so a poisoned map is still consistent.
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        self.lock().insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// Stores each key as a file under a root directory.
///
/// Writes go to `<key>.pending` and are renamed over `<key>`, so readers
/// only ever observe complete values.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

/// Keys are single path components: ASCII alphanumerics, `-`, `_` and `.`,
/// not starting with a dot.
fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.ends_with(".pending")
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.path_for(key)?;
        tracing::trace!(path = %path.display(), "read");
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let pending = self.root.join(format!("{key}.pending"));
        tracing::trace!(path = %path.display(), bytes = value.len(), "write");

        fs::create_dir_all(&self.root)?;
        let result = write_synced(&pending, value).and_then(|()| fs::rename(&pending, &path));
        if let Err(e) = result {
            if let Err(cleanup) = fs::remove_file(&pending) {
                tracing::trace!(path = %pending.display(), error = %cleanup, "pending file not removed");
            }
            return Err(e.into());
        }
        Ok(())
    }
}

fn write_synced(path: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?;
    file.write_all(value)?;
    file.sync_all()
}
