use tracing::{debug, warn};

use super::{decode_cached, store_fetched};
use crate::api::client::CatalogApi;
use crate::api::query::{query_string, QueryFilters};
use crate::api::types::ListingPage;
use crate::cache::{CacheNamespace, CacheResult, CacheStore};
use crate::connectivity::ConnectivityMonitor;
use crate::error::{FetchFailure, ResolveError};

/// Resolves paginated, filtered character listings.
#[derive(Clone)]
pub struct ListingResolver {
  store: CacheStore,
  api: CatalogApi,
  connectivity: ConnectivityMonitor,
}

impl ListingResolver {
  pub fn new(store: CacheStore, api: CatalogApi, connectivity: ConnectivityMonitor) -> Self {
    Self {
      store,
      api,
      connectivity,
    }
  }

  /// 1. Valid cache entry: return it
  /// 2. Offline: [`ResolveError::OfflineNoData`]
  /// 3. Fetch and write through. A timeout is surfaced as is; any other
  ///    failure falls back to the entry for the same key even if it has
  ///    expired, and is surfaced only when there is none.
  pub async fn resolve(
    &self,
    page: u32,
    filters: &QueryFilters,
  ) -> Result<CacheResult<ListingPage>, ResolveError> {
    let key = query_string(page, filters);
    let online = self.connectivity.is_online();

    if let Some(entry) = self.store.lookup(CacheNamespace::Listing, &key) {
      if let Some(listing) = decode_cached(CacheNamespace::Listing, &key, entry.data) {
        return Ok(CacheResult::from_cache(listing, entry.timestamp, !online));
      }
    }

    if !online {
      debug!(key, "Offline with no cached listing");
      return Err(ResolveError::OfflineNoData);
    }

    match self.api.characters(&key).await {
      Ok(listing) => {
        store_fetched(&self.store, CacheNamespace::Listing, &key, &listing);
        Ok(CacheResult::from_network(listing))
      }
      Err(FetchFailure::Timeout) => Err(ResolveError::Timeout),
      Err(failure) => {
        if let Some(entry) = self.store.get_stale(CacheNamespace::Listing, &key) {
          if let Some(listing) = decode_cached(CacheNamespace::Listing, &key, entry.data) {
            warn!(key, error = %failure, "Network error. Showing cached data");
            return Ok(CacheResult::degraded(listing, entry.timestamp));
          }
        }
        Err(failure.into())
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::query::Status;
  use crate::cache::CacheSource;
  use crate::resolve::fixtures::{listing, Harness, BASE};
  use chrono::Duration;
  use std::time::Duration as StdDuration;

  fn resolver(h: &Harness) -> ListingResolver {
    ListingResolver::new(h.store.clone(), h.api.clone(), h.connectivity.clone())
  }

  fn url(query: &str) -> String {
    format!("{}/character{}", BASE, query)
  }

  #[tokio::test]
  async fn test_second_identical_request_is_cache_hit() {
    let h = Harness::new();
    h.transport.ok(&url("?page=1"), listing(&["Rick Sanchez", "Morty Smith"], 42));
    let resolver = resolver(&h);
    let mut stats = h.store.subscribe_stats();

    let first = resolver.resolve(1, &QueryFilters::default()).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);
    assert_eq!(first.data.results.len(), 2);
    assert_eq!(stats.borrow_and_update().listings, 1);

    let second = resolver.resolve(1, &QueryFilters::default()).await.unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert_eq!(second.data, first.data);

    assert_eq!(h.transport.call_count(&url("?page=1")), 1);
    assert_eq!(h.store.stats().listings, 1);
  }

  #[tokio::test]
  async fn test_filters_are_part_of_the_key() {
    let h = Harness::new();
    h.transport.ok(&url("?page=1"), listing(&["Rick Sanchez"], 42));
    h.transport
      .ok(&url("?page=1&status=dead"), listing(&["Birdperson"], 3));
    let resolver = resolver(&h);

    resolver.resolve(1, &QueryFilters::default()).await.unwrap();
    let dead = QueryFilters {
      status: Some(Status::Dead),
      ..Default::default()
    };
    let result = resolver.resolve(1, &dead).await.unwrap();
    assert_eq!(result.source, CacheSource::Network);
    assert_eq!(result.data.results[0].name, "Birdperson");
  }

  #[tokio::test]
  async fn test_offline_with_valid_entry_serves_cache() {
    let h = Harness::new();
    h.transport.ok(&url("?page=2"), listing(&["Summer Smith"], 42));
    let resolver = resolver(&h);
    resolver.resolve(2, &QueryFilters::default()).await.unwrap();

    h.go_offline();
    let result = resolver.resolve(2, &QueryFilters::default()).await.unwrap();
    assert_eq!(result.source, CacheSource::Offline);
    assert!(result.is_cached());
    assert_eq!(h.transport.calls().len(), 1);
  }

  #[tokio::test]
  async fn test_offline_without_entry_is_offline_no_data() {
    let h = Harness::new();
    h.go_offline();

    let err = resolver(&h)
      .resolve(1, &QueryFilters::default())
      .await
      .unwrap_err();
    assert_eq!(err, ResolveError::OfflineNoData);
    assert!(h.transport.calls().is_empty());
  }

  #[tokio::test]
  async fn test_fetch_failure_falls_back_to_expired_entry() {
    let mut h = Harness::new();
    h.store = h.store.clone().with_expiration(Duration::zero());
    h.transport.ok(&url("?page=1"), listing(&["Rick Sanchez"], 42));
    let resolver = resolver(&h);
    resolver.resolve(1, &QueryFilters::default()).await.unwrap();

    // Entry is now expired, so the next call goes to the network and fails
    h.transport.fail(&url("?page=1"), "connection reset");
    let result = resolver.resolve(1, &QueryFilters::default()).await.unwrap();
    assert_eq!(result.source, CacheSource::Degraded);
    assert_eq!(result.data.results[0].name, "Rick Sanchez");
    assert_eq!(h.transport.call_count(&url("?page=1")), 2);
  }

  #[tokio::test]
  async fn test_api_error_falls_back_to_stale_entry() {
    let mut h = Harness::new();
    h.store = h.store.clone().with_expiration(Duration::zero());
    h.transport.ok(&url("?page=1"), listing(&["Rick Sanchez"], 42));
    let resolver = resolver(&h);
    resolver.resolve(1, &QueryFilters::default()).await.unwrap();

    h.transport
      .status(&url("?page=1"), 500, r#"{"error":"Internal error"}"#);
    let result = resolver.resolve(1, &QueryFilters::default()).await.unwrap();
    assert_eq!(result.source, CacheSource::Degraded);
  }

  #[tokio::test]
  async fn test_fetch_failure_without_entry_surfaces_error() {
    let h = Harness::new();
    h.transport.fail(&url("?page=1"), "connection reset");

    let err = resolver(&h)
      .resolve(1, &QueryFilters::default())
      .await
      .unwrap_err();
    assert_eq!(err, ResolveError::Network("connection reset".to_string()));
  }

  #[tokio::test]
  async fn test_api_error_message_is_kept() {
    let h = Harness::new();
    let filters = QueryFilters {
      name: "nobody".to_string(),
      ..Default::default()
    };
    h.transport.status(
      &url("?page=1&name=nobody"),
      404,
      r#"{"error":"There is nothing here"}"#,
    );

    let err = resolver(&h).resolve(1, &filters).await.unwrap_err();
    assert_eq!(err, ResolveError::Api("There is nothing here".to_string()));
    assert_eq!(h.store.stats().listings, 0);
  }

  #[tokio::test(start_paused = true)]
  async fn test_timeout_is_surfaced_even_with_stale_entry() {
    let mut h = Harness::new();
    h.store = h.store.clone().with_expiration(Duration::zero());
    h.transport.ok(&url("?page=1"), listing(&["Rick Sanchez"], 42));
    let resolver = resolver(&h);
    resolver.resolve(1, &QueryFilters::default()).await.unwrap();

    h.transport.hang(&url("?page=1"));
    let err = tokio::time::timeout(
      StdDuration::from_secs(60),
      resolver.resolve(1, &QueryFilters::default()),
    )
    .await
    .unwrap()
    .unwrap_err();
    assert_eq!(err, ResolveError::Timeout);
  }
}
