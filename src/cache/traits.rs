//! Core types for the caching system.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the three independent key spaces held by the cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheNamespace {
  /// Paginated character listings, keyed by query string
  Listing,
  /// Individual character records, keyed by id
  Detail,
  /// Episode records fetched for a detail view, keyed by episode id
  DependentResource,
}

impl CacheNamespace {
  pub const ALL: [CacheNamespace; 3] = [
    CacheNamespace::Listing,
    CacheNamespace::Detail,
    CacheNamespace::DependentResource,
  ];

  /// Short name used in commands and log lines
  pub fn label(self) -> &'static str {
    match self {
      CacheNamespace::Listing => "listing",
      CacheNamespace::Detail => "detail",
      CacheNamespace::DependentResource => "episodes",
    }
  }
}

impl fmt::Display for CacheNamespace {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for CacheNamespace {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "listing" | "listings" | "characters" => Ok(CacheNamespace::Listing),
      "detail" | "details" | "character" => Ok(CacheNamespace::Detail),
      "episodes" | "episode" | "dependent" => Ok(CacheNamespace::DependentResource),
      other => Err(format!("unknown cache namespace: {}", other)),
    }
  }
}

/// A cached value and the instant it was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
  pub data: serde_json::Value,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub timestamp: DateTime<Utc>,
}

impl CacheEntry {
  pub fn new(data: serde_json::Value) -> Self {
    Self {
      data,
      timestamp: Utc::now(),
    }
  }

  /// An entry is valid while its age is strictly below the window.
  pub fn is_valid_at(&self, now: DateTime<Utc>, window: Duration) -> bool {
    now - self.timestamp < window
  }
}

/// Per-namespace entry counts plus hit/miss tallies, published for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
  pub listings: usize,
  pub details: usize,
  pub episodes: usize,
  pub hits: u64,
  pub misses: u64,
}

impl CacheStats {
  pub fn total(&self) -> usize {
    self.listings + self.details + self.episodes
  }
}

/// Result from a resolver, including data and metadata about the source.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
  /// When the data was cached (if from cache)
  pub cached_at: Option<DateTime<Utc>>,
}

impl<T> CacheResult<T> {
  /// Create a new cache result from fresh network data.
  pub fn from_network(data: T) -> Self {
    Self {
      data,
      source: CacheSource::Network,
      cached_at: None,
    }
  }

  /// Create a new cache result from a valid cache entry.
  pub fn from_cache(data: T, cached_at: DateTime<Utc>, offline: bool) -> Self {
    Self {
      data,
      source: if offline {
        CacheSource::Offline
      } else {
        CacheSource::Cache
      },
      cached_at: Some(cached_at),
    }
  }

  /// Create a new cache result served after a failed fetch.
  pub fn degraded(data: T, cached_at: DateTime<Utc>) -> Self {
    Self {
      data,
      source: CacheSource::Degraded,
      cached_at: Some(cached_at),
    }
  }

  /// Whether the data was served from the cache rather than the network.
  pub fn is_cached(&self) -> bool {
    self.source != CacheSource::Network
  }
}

/// Indicates where resolved data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// Fresh data from network
  Network,
  /// Valid cache entry while online
  Cache,
  /// Valid cache entry while offline
  Offline,
  /// Possibly expired cache entry served because the network fetch failed
  Degraded,
}
