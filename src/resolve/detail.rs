use tracing::debug;

use super::{decode_cached, store_fetched};
use crate::api::client::CatalogApi;
use crate::api::types::Character;
use crate::cache::{CacheNamespace, CacheResult, CacheStore};
use crate::connectivity::ConnectivityMonitor;
use crate::error::ResolveError;

/// Resolves single character records by id.
#[derive(Clone)]
pub struct DetailResolver {
  store: CacheStore,
  api: CatalogApi,
  connectivity: ConnectivityMonitor,
}

impl DetailResolver {
  pub fn new(store: CacheStore, api: CatalogApi, connectivity: ConnectivityMonitor) -> Self {
    Self {
      store,
      api,
      connectivity,
    }
  }

  /// Cache, then offline check, then fetch. Unlike listings there is no
  /// stale fallback: a failed fetch is propagated.
  pub async fn resolve(&self, id: u64) -> Result<CacheResult<Character>, ResolveError> {
    let key = id.to_string();
    let online = self.connectivity.is_online();

    if let Some(entry) = self.store.lookup(CacheNamespace::Detail, &key) {
      if let Some(character) = decode_cached(CacheNamespace::Detail, &key, entry.data) {
        return Ok(CacheResult::from_cache(character, entry.timestamp, !online));
      }
    }

    if !online {
      debug!(id, "Cannot load character details while offline");
      return Err(ResolveError::OfflineNoData);
    }

    let character = self.api.character(id).await?;
    store_fetched(&self.store, CacheNamespace::Detail, &key, &character);
    Ok(CacheResult::from_network(character))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;
  use crate::resolve::fixtures::{character, Harness, BASE};
  use chrono::Duration;

  fn resolver(h: &Harness) -> DetailResolver {
    DetailResolver::new(h.store.clone(), h.api.clone(), h.connectivity.clone())
  }

  fn url(id: u64) -> String {
    format!("{}/character/{}", BASE, id)
  }

  #[tokio::test]
  async fn test_fetch_then_cache_hit() {
    let h = Harness::new();
    h.transport.ok(&url(1), character(1, "Rick Sanchez"));
    let resolver = resolver(&h);

    let first = resolver.resolve(1).await.unwrap();
    assert!(!first.is_cached());
    let second = resolver.resolve(1).await.unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data.name, "Rick Sanchez");
    assert_eq!(h.transport.call_count(&url(1)), 1);
  }

  #[tokio::test]
  async fn test_offline_cache_hit_and_miss() {
    let h = Harness::new();
    h.transport.ok(&url(1), character(1, "Rick Sanchez"));
    let resolver = resolver(&h);
    resolver.resolve(1).await.unwrap();

    h.go_offline();
    let cached = resolver.resolve(1).await.unwrap();
    assert_eq!(cached.source, CacheSource::Offline);
    assert_eq!(resolver.resolve(2).await.unwrap_err(), ResolveError::OfflineNoData);
  }

  #[tokio::test]
  async fn test_fetch_failure_does_not_fall_back_to_stale_entry() {
    let mut h = Harness::new();
    h.store = h.store.clone().with_expiration(Duration::zero());
    h.transport.ok(&url(1), character(1, "Rick Sanchez"));
    let resolver = resolver(&h);
    resolver.resolve(1).await.unwrap();
    assert!(h.store.get_stale(CacheNamespace::Detail, "1").is_some());

    h.transport.fail(&url(1), "connection reset");
    let err = resolver.resolve(1).await.unwrap_err();
    assert_eq!(err, ResolveError::Network("connection reset".to_string()));
  }

  #[tokio::test]
  async fn test_fetch_failure_without_entry_propagates() {
    let h = Harness::new();
    h.transport
      .status(&url(9999), 404, r#"{"error":"Character not found"}"#);

    let err = resolver(&h).resolve(9999).await.unwrap_err();
    assert_eq!(err, ResolveError::Api("Character not found".to_string()));
    assert_eq!(h.store.stats().details, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout() {
    let h = Harness::new();
    h.transport.hang(&url(1));
    assert_eq!(resolver(&h).resolve(1).await.unwrap_err(), ResolveError::Timeout);
  }
}
