use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use url::Url;

use crate::api::types::{Character, Episode, ListingPage};
use crate::error::FetchFailure;
use crate::fetch::FetchGate;

/// Rick and Morty API endpoints over the fetch gate
#[derive(Clone)]
pub struct CatalogApi {
  gate: FetchGate,
  base_url: String,
}

impl CatalogApi {
  pub fn new(gate: FetchGate, base_url: &str) -> Self {
    Self {
      gate,
      base_url: base_url.trim_end_matches('/').to_string(),
    }
  }

  pub fn gate(&self) -> &FetchGate {
    &self.gate
  }

  /// URL of a listing page for a query string built by `query_string`
  pub fn characters_url(&self, query: &str) -> String {
    format!("{}/character{}", self.base_url, query)
  }

  pub fn character_url(&self, id: u64) -> String {
    format!("{}/character/{}", self.base_url, id)
  }

  /// Absolute URL for an episode reference. References from the API are
  /// absolute; relative ones resolve against the base URL.
  pub fn reference_url(&self, reference: &str) -> String {
    if Url::parse(reference).is_ok() {
      reference.to_string()
    } else if reference.starts_with('/') {
      format!("{}{}", self.base_url, reference)
    } else {
      format!("{}/{}", self.base_url, reference)
    }
  }

  /// Get one page of characters
  pub async fn characters(&self, query: &str) -> Result<ListingPage, FetchFailure> {
    let value = self.gate.fetch(&self.characters_url(query)).await?;
    decode(value)
  }

  /// Get a single character by id
  pub async fn character(&self, id: u64) -> Result<Character, FetchFailure> {
    let value = self.gate.fetch(&self.character_url(id)).await?;
    decode(value)
  }

  /// Get an episode, giving up at `deadline`
  pub async fn episode(&self, reference: &str, deadline: Instant) -> Result<Episode, FetchFailure> {
    let value = self
      .gate
      .fetch_until(&self.reference_url(reference), deadline)
      .await?;
    decode(value)
  }
}

/// Extract the episode id from its reference: the last path segment.
pub fn episode_id(reference: &str) -> &str {
  let path = reference.split(['?', '#']).next().unwrap_or(reference);
  path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, FetchFailure> {
  serde_json::from_value(value)
    .map_err(|e| FetchFailure::NetworkError(format!("Unexpected response shape: {}", e)))
}
