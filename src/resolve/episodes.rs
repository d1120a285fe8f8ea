use futures::future::join_all;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{decode_cached, store_fetched};
use crate::api::client::{episode_id, CatalogApi};
use crate::api::types::{Episode, PlaceholderKind};
use crate::cache::{CacheNamespace, CacheStore};
use crate::connectivity::ConnectivityMonitor;
use crate::error::FetchFailure;

/// Resolves the episodes a character appears in.
#[derive(Clone)]
pub struct EpisodeResolver {
  store: CacheStore,
  api: CatalogApi,
  connectivity: ConnectivityMonitor,
}

impl EpisodeResolver {
  pub fn new(store: CacheStore, api: CatalogApi, connectivity: ConnectivityMonitor) -> Self {
    Self {
      store,
      api,
      connectivity,
    }
  }

  /// Resolve every reference. Cached episodes are used as is; missing ones
  /// are fetched concurrently under one shared deadline, or replaced by an
  /// offline placeholder when there is no connection. A failed fetch becomes
  /// a placeholder without affecting the others.
  ///
  /// The result is ordered by the number in the episode code, ascending.
  pub async fn resolve(&self, references: &[String]) -> Vec<Episode> {
    let online = self.connectivity.is_online();
    let mut episodes = Vec::with_capacity(references.len());
    let mut queued = Vec::new();

    for reference in references {
      let id = episode_id(reference);
      let cached = self
        .store
        .get(CacheNamespace::DependentResource, id)
        .and_then(|data| decode_cached::<Episode>(CacheNamespace::DependentResource, id, data));

      match cached {
        Some(episode) => episodes.push(episode),
        None if online => queued.push((id, reference.as_str())),
        None => episodes.push(Episode::placeholder(
          id,
          reference,
          PlaceholderKind::OfflineUnavailable,
        )),
      }
    }

    if !queued.is_empty() {
      debug!(count = queued.len(), "Fetching episodes");
      let deadline = Instant::now() + self.api.gate().timeout();
      let fetches = queued
        .into_iter()
        .map(|(id, reference)| self.fetch_one(id, reference, deadline));
      episodes.extend(join_all(fetches).await);
    }

    sort_by_code(&mut episodes);
    episodes
  }

  async fn fetch_one(&self, id: &str, reference: &str, deadline: Instant) -> Episode {
    match self.api.episode(reference, deadline).await {
      Ok(episode) => {
        store_fetched(&self.store, CacheNamespace::DependentResource, id, &episode);
        episode
      }
      Err(FetchFailure::Timeout) => Episode::placeholder(id, reference, PlaceholderKind::Timeout),
      Err(failure) => {
        warn!(reference, error = %failure, "Error fetching episode");
        Episode::placeholder(id, reference, PlaceholderKind::Error)
      }
    }
  }
}

/// Stable ascending sort on the episode code number; codes without digits go last.
/// Placeholders sort by their raw id, so `EP2` comes before `S01E01` (101).
fn sort_by_code(episodes: &mut [Episode]) {
  episodes.sort_by_key(|episode| episode.code_number().unwrap_or(u64::MAX));
}
