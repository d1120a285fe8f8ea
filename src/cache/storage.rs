//! Durable snapshot storage trait and SQLite implementation.

use color_eyre::{eyre::eyre, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::StorageError;

/// A string-keyed blob store. The cache keeps its whole snapshot under one key.
pub trait SnapshotStorage: Send + Sync {
  /// Read the blob stored under `key`, if any.
  fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

  /// Replace the blob stored under `key`.
  fn write(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// Storage implementation that doesn't persist anything.
/// Used when persistence is disabled - all operations are no-ops.
pub struct NoopStorage;

impl SnapshotStorage for NoopStorage {
  fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
    Ok(None) // Nothing saved
  }

  fn write(&self, _key: &str, _blob: &str) -> Result<(), StorageError> {
    Ok(()) // Discard
  }
}

/// SQLite-based snapshot storage.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open the storage at `path` (or the default location), optionally capping
  /// the database size at `max_bytes`.
  pub fn open(path: Option<&Path>, max_bytes: Option<u64>) -> Result<Self> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)
        .map_err(|e| eyre!("Failed to create cache directory: {}", e))?;
    }

    let conn = Connection::open(&path)
      .map_err(|e| eyre!("Failed to open cache database at {}: {}", path.display(), e))?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;
    if let Some(max_bytes) = max_bytes {
      storage.apply_quota(max_bytes)?;
    }

    Ok(storage)
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("rickdex").join("cache.db"))
  }

  /// Run database migrations for the snapshot table.
  fn run_migrations(&self) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    conn
      .execute_batch(SNAPSHOT_SCHEMA)
      .map_err(|e| eyre!("Failed to run cache migrations: {}", e))?;

    Ok(())
  }

  /// Cap the database file size. Writes past the cap fail with SQLITE_FULL.
  fn apply_quota(&self, max_bytes: u64) -> Result<()> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| eyre!("Lock poisoned: {}", e))?;

    let page_size: i64 = conn
      .query_row("PRAGMA page_size", [], |row| row.get(0))
      .map_err(|e| eyre!("Failed to read page size: {}", e))?;
    let page_size = u64::try_from(page_size).unwrap_or(4096).max(1);
    let max_pages = (max_bytes / page_size).max(1);

    // The pragma returns the effective limit, which is never below the current page count
    let _effective: i64 = conn
      .query_row(&format!("PRAGMA max_page_count = {}", max_pages), [], |row| {
        row.get(0)
      })
      .map_err(|e| eyre!("Failed to set storage quota: {}", e))?;

    Ok(())
  }
}

/// Schema for the snapshot table.
const SNAPSHOT_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

impl SnapshotStorage for SqliteStorage {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))?;

    conn
      .query_row(
        "SELECT value FROM kv_store WHERE key = ?",
        params![key],
        |row| row.get(0),
      )
      .optional()
      .map_err(map_sqlite_error)
  }

  fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
    let conn = self
      .conn
      .lock()
      .map_err(|e| StorageError::Backend(format!("Lock poisoned: {}", e)))?;

    conn
      .execute(
        "INSERT OR REPLACE INTO kv_store (key, value, updated_at)
         VALUES (?, ?, datetime('now'))",
        params![key, blob],
      )
      .map_err(map_sqlite_error)?;

    Ok(())
  }
}

/// SQLITE_FULL is how a capped database reports quota exhaustion.
fn map_sqlite_error(e: rusqlite::Error) -> StorageError {
  match e {
    rusqlite::Error::SqliteFailure(err, _) if err.code == rusqlite::ErrorCode::DiskFull => {
      StorageError::QuotaExceeded
    }
    other => StorageError::Backend(other.to_string()),
  }
}

/// In-memory storage with an adjustable byte quota, for tests.
#[cfg(test)]
pub(crate) struct MemoryStorage {
  blobs: Mutex<std::collections::HashMap<String, String>>,
  quota: Mutex<Option<usize>>,
  writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MemoryStorage {
  pub(crate) fn new() -> Self {
    Self {
      blobs: Mutex::new(std::collections::HashMap::new()),
      quota: Mutex::new(None),
      writes: std::sync::atomic::AtomicUsize::new(0),
    }
  }

  pub(crate) fn with_blob(key: &str, blob: &str) -> Self {
    let storage = Self::new();
    storage
      .blobs
      .lock()
      .unwrap()
      .insert(key.to_string(), blob.to_string());
    storage
  }

  /// Reject any write whose blob is longer than `bytes`.
  pub(crate) fn set_quota(&self, bytes: Option<usize>) {
    *self.quota.lock().unwrap() = bytes;
  }

  pub(crate) fn blob(&self, key: &str) -> Option<String> {
    self.blobs.lock().unwrap().get(key).cloned()
  }

  /// Number of write attempts, successful or not.
  pub(crate) fn write_attempts(&self) -> usize {
    self.writes.load(std::sync::atomic::Ordering::SeqCst)
  }
}

#[cfg(test)]
impl SnapshotStorage for MemoryStorage {
  fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.blob(key))
  }

  fn write(&self, key: &str, blob: &str) -> Result<(), StorageError> {
    self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    if let Some(limit) = *self.quota.lock().unwrap() {
      if blob.len() > limit {
        return Err(StorageError::QuotaExceeded);
      }
    }
    self
      .blobs
      .lock()
      .unwrap()
      .insert(key.to_string(), blob.to_string());
    Ok(())
  }
}
