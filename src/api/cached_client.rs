//! Catalog client that routes every read through the resolvers.

use crate::api::client::CatalogApi;
use crate::api::query::QueryFilters;
use crate::api::types::{Character, Episode, ListingPage};
use crate::cache::{CacheResult, CacheStore};
use crate::connectivity::ConnectivityMonitor;
use crate::error::ResolveError;
use crate::resolve::{DetailResolver, EpisodeResolver, ListingResolver};

/// A character together with its episodes, as shown in the detail view.
#[derive(Debug, Clone)]
pub struct CharacterDetail {
  pub character: CacheResult<Character>,
  /// Sorted by episode code
  pub episodes: Vec<Episode>,
}

/// Catalog client with transparent caching and offline support.
///
/// Holds one store, one connectivity monitor and the three resolvers built
/// on them; clones share all of it.
#[derive(Clone)]
pub struct CachedCatalogClient {
  store: CacheStore,
  connectivity: ConnectivityMonitor,
  listing: ListingResolver,
  detail: DetailResolver,
  episodes: EpisodeResolver,
}

impl CachedCatalogClient {
  pub fn new(api: CatalogApi, store: CacheStore, connectivity: ConnectivityMonitor) -> Self {
    Self {
      listing: ListingResolver::new(store.clone(), api.clone(), connectivity.clone()),
      detail: DetailResolver::new(store.clone(), api.clone(), connectivity.clone()),
      episodes: EpisodeResolver::new(store.clone(), api, connectivity.clone()),
      store,
      connectivity,
    }
  }

  /// Get one page of characters matching `filters`.
  pub async fn characters(
    &self,
    page: u32,
    filters: &QueryFilters,
  ) -> Result<CacheResult<ListingPage>, ResolveError> {
    self.listing.resolve(page, filters).await
  }

  /// Get a single character by id.
  pub async fn character(&self, id: u64) -> Result<CacheResult<Character>, ResolveError> {
    self.detail.resolve(id).await
  }

  /// Get the episodes behind a list of episode references.
  pub async fn episodes(&self, references: &[String]) -> Vec<Episode> {
    self.episodes.resolve(references).await
  }

  /// Get a character and then every episode it appears in.
  pub async fn character_with_episodes(&self, id: u64) -> Result<CharacterDetail, ResolveError> {
    let character = self.character(id).await?;
    let episodes = self.episodes(&character.data.episode).await;
    Ok(CharacterDetail {
      character,
      episodes,
    })
  }

  pub fn store(&self) -> &CacheStore {
    &self.store
  }

  pub fn connectivity(&self) -> &ConnectivityMonitor {
    &self.connectivity
  }
}
