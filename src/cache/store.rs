//! Namespace-partitioned, time-expiring cache with snapshot persistence.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, Notify};
use tracing::{debug, info, warn};

use super::storage::SnapshotStorage;
use super::traits::{CacheEntry, CacheNamespace, CacheStats};
use crate::error::StorageError;

/// Storage key holding the serialized snapshot.
pub const SNAPSHOT_KEY: &str = "rickdex.cache";

type EntryMap = HashMap<String, CacheEntry>;

/// Everything the store persists. All three fields are required to deserialize.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PersistedSnapshot {
  pub characters: EntryMap,
  #[serde(rename = "characterDetails")]
  pub character_details: EntryMap,
  pub episodes: EntryMap,
}

/// Borrowed view used to serialize without cloning the maps.
#[derive(Serialize)]
struct SnapshotRef<'a> {
  characters: &'a EntryMap,
  #[serde(rename = "characterDetails")]
  character_details: &'a EntryMap,
  episodes: &'a EntryMap,
}

/// How a persist attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistOutcome {
  /// Full snapshot written
  Saved,
  /// Quota hit; listings dropped and the reduced snapshot written
  SavedWithoutListings,
  /// Quota hit twice; every namespace cleared
  Cleared,
}

#[derive(Default)]
struct Namespaces {
  listing: EntryMap,
  detail: EntryMap,
  episodes: EntryMap,
  hits: u64,
  misses: u64,
}

impl Namespaces {
  fn map(&self, namespace: CacheNamespace) -> &EntryMap {
    match namespace {
      CacheNamespace::Listing => &self.listing,
      CacheNamespace::Detail => &self.detail,
      CacheNamespace::DependentResource => &self.episodes,
    }
  }

  fn map_mut(&mut self, namespace: CacheNamespace) -> &mut EntryMap {
    match namespace {
      CacheNamespace::Listing => &mut self.listing,
      CacheNamespace::Detail => &mut self.detail,
      CacheNamespace::DependentResource => &mut self.episodes,
    }
  }

  fn stats(&self) -> CacheStats {
    CacheStats {
      listings: self.listing.len(),
      details: self.detail.len(),
      episodes: self.episodes.len(),
      hits: self.hits,
      misses: self.misses,
    }
  }
}

/// The persisted cache store.
///
/// Cloning is cheap and every clone shares the same entries, so the store can
/// be handed to each resolver and to the maintenance task. Writes from
/// interleaved resolutions are last-write-wins per key.
#[derive(Clone)]
pub struct CacheStore {
  inner: Arc<Mutex<Namespaces>>,
  storage: Arc<dyn SnapshotStorage>,
  /// How long an entry stays valid after it is written
  expiration: Duration,
  stats_tx: Arc<watch::Sender<CacheStats>>,
  persist_requested: Arc<Notify>,
}

impl CacheStore {
  /// Create an empty store backed by `storage`.
  pub fn new(storage: Arc<dyn SnapshotStorage>) -> Self {
    let (stats_tx, _) = watch::channel(CacheStats::default());
    Self {
      inner: Arc::new(Mutex::new(Namespaces::default())),
      storage,
      expiration: Duration::hours(1),
      stats_tx: Arc::new(stats_tx),
      persist_requested: Arc::new(Notify::new()),
    }
  }

  /// Set the expiration window for all namespaces.
  pub fn with_expiration(mut self, expiration: Duration) -> Self {
    self.expiration = expiration;
    self
  }

  fn lock(&self) -> MutexGuard<'_, Namespaces> {
    // No invariant spans more than one statement, so a poisoned map is still usable
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// True iff an unexpired entry exists.
  pub fn has(&self, namespace: CacheNamespace, key: &str) -> bool {
    let now = Utc::now();
    self
      .lock()
      .map(namespace)
      .get(key)
      .is_some_and(|entry| entry.is_valid_at(now, self.expiration))
  }

  /// Strict read returning the whole entry. Counts a hit or miss and
  /// publishes stats on a hit.
  pub fn lookup(&self, namespace: CacheNamespace, key: &str) -> Option<CacheEntry> {
    let now = Utc::now();
    let (entry, stats) = {
      let mut inner = self.lock();
      let entry = inner
        .map(namespace)
        .get(key)
        .filter(|entry| entry.is_valid_at(now, self.expiration))
        .cloned();
      match entry {
        Some(_) => inner.hits += 1,
        None => inner.misses += 1,
      }
      (entry, inner.stats())
    };

    if entry.is_some() {
      debug!(namespace = %namespace, key, "Using cached data");
      self.stats_tx.send_replace(stats);
    }
    entry
  }

  /// Strict read of the stored value.
  pub fn get(&self, namespace: CacheNamespace, key: &str) -> Option<Value> {
    self.lookup(namespace, key).map(|entry| entry.data)
  }

  /// Lenient read that ignores expiry. Only for fallback after a failed fetch.
  pub fn get_stale(&self, namespace: CacheNamespace, key: &str) -> Option<CacheEntry> {
    self.lock().map(namespace).get(key).cloned()
  }

  /// Replace the entry for `key` and schedule a persist.
  pub fn set(&self, namespace: CacheNamespace, key: &str, data: Value) {
    debug!(namespace = %namespace, key, "Caching data");
    let stats = {
      let mut inner = self.lock();
      inner
        .map_mut(namespace)
        .insert(key.to_string(), CacheEntry::new(data));
      inner.stats()
    };
    self.stats_tx.send_replace(stats);
    self.request_persist();
  }

  /// Empty one namespace, or all of them, and schedule a persist.
  pub fn clear(&self, namespace: Option<CacheNamespace>) {
    self.clear_in_memory(namespace);
    match namespace {
      Some(ns) => info!(namespace = %ns, "Cleared cache namespace"),
      None => info!("Cleared all cache"),
    }
    self.request_persist();
  }

  fn clear_in_memory(&self, namespace: Option<CacheNamespace>) {
    let stats = {
      let mut inner = self.lock();
      match namespace {
        Some(ns) => inner.map_mut(ns).clear(),
        None => {
          for ns in CacheNamespace::ALL {
            inner.map_mut(ns).clear();
          }
        }
      }
      inner.stats()
    };
    self.stats_tx.send_replace(stats);
  }

  /// Delete every expired entry in every namespace. Returns how many were removed.
  pub fn sweep(&self) -> usize {
    let now = Utc::now();
    let (removed, stats) = {
      let mut inner = self.lock();
      let mut removed = 0;
      for ns in CacheNamespace::ALL {
        let map = inner.map_mut(ns);
        let before = map.len();
        map.retain(|_, entry| entry.is_valid_at(now, self.expiration));
        removed += before - map.len();
      }
      (removed, inner.stats())
    };

    if removed > 0 {
      info!(removed, "Cleaned expired cache entries");
      self.stats_tx.send_replace(stats);
      self.request_persist();
    }
    removed
  }

  /// Write the snapshot to durable storage.
  ///
  /// When the quota is exhausted the listing namespace is dropped and the
  /// write retried once; if that fails too, every namespace is cleared.
  /// Any other storage error is returned untouched.
  pub fn persist(&self) -> Result<PersistOutcome, StorageError> {
    match self.write_snapshot() {
      Ok(()) => {
        debug!("Cache saved");
        return Ok(PersistOutcome::Saved);
      }
      Err(e) if e.is_quota() => {
        warn!("Storage quota exceeded, clearing character listings cache");
      }
      Err(e) => return Err(e),
    }

    self.clear_in_memory(Some(CacheNamespace::Listing));
    if let Err(e) = self.write_snapshot() {
      warn!(error = %e, "Still cannot save cache, clearing all cache");
      self.clear_in_memory(None);
      if let Err(e) = self.write_snapshot() {
        debug!(error = %e, "Could not write empty snapshot");
      }
      return Ok(PersistOutcome::Cleared);
    }

    Ok(PersistOutcome::SavedWithoutListings)
  }

  fn write_snapshot(&self) -> Result<(), StorageError> {
    let blob = {
      let inner = self.lock();
      serde_json::to_string(&SnapshotRef {
        characters: &inner.listing,
        character_details: &inner.detail,
        episodes: &inner.episodes,
      })?
    };
    self.storage.write(SNAPSHOT_KEY, &blob)
  }

  /// Load the snapshot saved by a previous run.
  ///
  /// The snapshot is adopted only when all three namespaces are present. A
  /// missing, unreadable or malformed snapshot leaves the store empty.
  /// Returns whether a snapshot was adopted.
  pub fn restore(&self) -> bool {
    let blob = match self.storage.read(SNAPSHOT_KEY) {
      Ok(Some(blob)) => blob,
      Ok(None) => {
        debug!("No saved cache snapshot");
        return false;
      }
      Err(e) => {
        warn!(error = %e, "Error reading cache snapshot");
        self.clear_in_memory(None);
        return false;
      }
    };

    let snapshot: PersistedSnapshot = match serde_json::from_str(&blob) {
      Ok(snapshot) => snapshot,
      Err(e) => {
        let e = StorageError::from(e);
        warn!(error = %e, "Discarding cache snapshot");
        self.clear_in_memory(None);
        return false;
      }
    };

    let stats = {
      let mut inner = self.lock();
      inner.listing = snapshot.characters;
      inner.detail = snapshot.character_details;
      inner.episodes = snapshot.episodes;
      inner.stats()
    };
    info!(entries = stats.total(), "Cache loaded from storage");
    self.stats_tx.send_replace(stats);
    true
  }

  pub fn stats(&self) -> CacheStats {
    self.lock().stats()
  }

  /// Receive a fresh [`CacheStats`] after every hit, write, clear and sweep.
  pub fn subscribe_stats(&self) -> watch::Receiver<CacheStats> {
    self.stats_tx.subscribe()
  }

  /// Signal used by the maintenance task to persist after writes.
  pub(crate) fn persist_signal(&self) -> Arc<Notify> {
    Arc::clone(&self.persist_requested)
  }

  fn request_persist(&self) {
    // Stores a permit if nobody is waiting, so bursts coalesce into one persist
    self.persist_requested.notify_one();
  }
}
