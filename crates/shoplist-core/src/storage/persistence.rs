//! Key-value settings store
//!
//! The store persists its whole collection as a single blob under one key.
//! Backends implement [`KeyValueStore`]:
//!
//! - [`FileKeyValueStore`] keeps one file per key (`<dir>/<key>.json`) and
//!   uses atomic writes (write to temp file, then rename) to prevent
//!   torn snapshots.
//! - [`MemoryKeyValueStore`] keeps values in memory. Clones share the same
//!   map, so a test can hand one clone to a `Store` and inspect the other.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::debug;

use super::error::{StorageError, StorageResult};

/// Minimal settings-store interface: bytes in, bytes out, one key at a time
pub trait KeyValueStore {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&mut self, key: &str, value: &[u8]) -> StorageResult<()>;
}

/// File-backed settings store
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    dir: PathBuf,
}

impl FileKeyValueStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| StorageError::CreateDirectory {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(Self { dir })
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::from_read(e, path)),
        }
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        let path = self.path_for(key)?;
        atomic_write(&path, value)?;
        debug!("Wrote {} bytes to {:?}", value.len(), path);
        Ok(())
    }
}

/// In-memory settings store
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    values: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a value exists under `key`
    pub fn contains(&self, key: &str) -> bool {
        self.values.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &[u8]) -> StorageResult<()> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }
}

/// Keys become file names, so only a conservative character set is allowed
fn validate_key(key: &str) -> StorageResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey {
            key: key.to_string(),
        })
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// The target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file =
        File::create(&temp_path).map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.write_all(data)
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    file.sync_all()
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::AtomicWriteFailed {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
