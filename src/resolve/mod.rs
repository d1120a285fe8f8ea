//! Resolvers answer "give me data for key K" by composing the cache store,
//! the connectivity monitor and the fetch gate.
//!
//! Each resource has its own fallback policy. The listing resolver serves a
//! stale entry when a live fetch fails; the detail resolver does not; the
//! episode resolver never fails and degrades to placeholder records instead.

mod detail;
mod episodes;
mod listing;

pub use detail::DetailResolver;
pub use episodes::EpisodeResolver;
pub use listing::ListingResolver;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::cache::{CacheNamespace, CacheStore};

/// Decode a cached value. An undecodable entry is treated as a miss.
fn decode_cached<T: DeserializeOwned>(namespace: CacheNamespace, key: &str, data: Value) -> Option<T> {
  match serde_json::from_value(data) {
    Ok(value) => Some(value),
    Err(e) => {
      warn!(namespace = %namespace, key, error = %e, "Ignoring undecodable cache entry");
      None
    }
  }
}

/// Write-through of freshly fetched data.
fn store_fetched<T: Serialize>(store: &CacheStore, namespace: CacheNamespace, key: &str, data: &T) {
  match serde_json::to_value(data) {
    Ok(value) => store.set(namespace, key, value),
    Err(e) => warn!(namespace = %namespace, key, error = %e, "Could not cache fetched data"),
  }
}
