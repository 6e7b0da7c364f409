//! # Usage Persistence
//!
//! The ledger stores its counters as a fixed 12-byte record under a stable
//! key. Where that record lives is up to the [`UsageStore`] implementation.
//!
//! ## Record Layout
//!
//! | Offset | Size | Field |
//! |--------|------|-------|
//! | 0 | 4 | lines printed (u32 LE) |
//! | 4 | 4 | characters printed (u32 LE) |
//! | 8 | 4 | feeds executed (u32 LE) |

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::TermicaError;

/// Size of a persisted usage record.
pub const RECORD_LEN: usize = 12;

/// Fixed-size usage record.
pub type UsageRecord = [u8; RECORD_LEN];

/// Key/value storage for usage records.
pub trait UsageStore: Send {
    fn save(&mut self, key: &str, record: &UsageRecord) -> Result<(), TermicaError>;

    /// `Ok(None)` when nothing was ever saved under `key`.
    fn load(&mut self, key: &str) -> Result<Option<UsageRecord>, TermicaError>;
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// Store backed by a shared map. Clones see the same records, which lets a
/// test "restart" a ledger against the data an earlier one wrote.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<HashMap<String, UsageRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UsageStore for MemoryStore {
    fn save(&mut self, key: &str, record: &UsageRecord) -> Result<(), TermicaError> {
        self.records
            .lock()
            .map_err(|_| TermicaError::Storage("usage store lock poisoned".into()))?
            .insert(key.to_string(), *record);
        Ok(())
    }

    fn load(&mut self, key: &str) -> Result<Option<UsageRecord>, TermicaError> {
        let records = self
            .records
            .lock()
            .map_err(|_| TermicaError::Storage("usage store lock poisoned".into()))?;
        Ok(records.get(key).copied())
    }
}

// ============================================================================
// FILE STORE
// ============================================================================

/// One file per key inside a directory: `<dir>/<key>.bin`.
///
/// Writes go to a temporary sibling first and are renamed into place, so a
/// power cut mid-write leaves the previous record intact.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Use `dir`, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, TermicaError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            TermicaError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.bin", key))
    }
}

impl UsageStore for FileStore {
    fn save(&mut self, key: &str, record: &UsageRecord) -> Result<(), TermicaError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("bin.tmp");
        fs::write(&tmp, record)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| {
                TermicaError::Storage(format!("Failed to write {}: {}", path.display(), e))
            })
    }

    fn load(&mut self, key: &str) -> Result<Option<UsageRecord>, TermicaError> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(TermicaError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )));
            }
        };
        let record: UsageRecord = bytes.as_slice().try_into().map_err(|_| {
            TermicaError::Storage(format!(
                "{} is {} bytes, expected {}",
                path.display(),
                bytes.len(),
                RECORD_LEN
            ))
        })?;
        Ok(Some(record))
    }
}

// ============================================================================
// TESTS
// ============================================================================
