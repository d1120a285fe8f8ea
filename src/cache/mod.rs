//! Persisted cache store for catalog data and offline support.
//!
//! This module provides:
//! - Three fixed namespaces (listings, character details, episodes)
//! - One expiration window, checked lazily on every read and swept on a timer
//! - Snapshot persistence with a degrade-on-quota policy
//! - Strict and lenient reads, the latter only for fallback after a failed fetch

mod maintenance;
mod storage;
mod store;
mod traits;

pub use maintenance::{persist_now, spawn_maintenance, MaintenanceIntervals};
#[cfg(test)]
pub(crate) use storage::MemoryStorage;
pub use storage::{NoopStorage, SnapshotStorage, SqliteStorage};
pub use store::{CacheStore, PersistOutcome};
pub use traits::{CacheNamespace, CacheResult, CacheSource, CacheStats};
