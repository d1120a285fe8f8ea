//! Catalog domain types, deserialized straight from API responses.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A `{name, url}` reference to an origin or location
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRef {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub url: String,
}

/// Full character record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub status: String,
  #[serde(default)]
  pub species: String,
  #[serde(rename = "type", default)]
  pub kind: String,
  #[serde(default)]
  pub gender: String,
  #[serde(default)]
  pub origin: NamedRef,
  #[serde(default)]
  pub location: NamedRef,
  #[serde(default)]
  pub image: String,
  /// Episode URLs, in airing order
  #[serde(default)]
  pub episode: Vec<String>,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub created: String,
}

/// Pagination metadata of a listing page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
  #[serde(default)]
  pub count: u64,
  #[serde(default)]
  pub pages: u32,
  pub next: Option<String>,
  pub prev: Option<String>,
}

/// One page of the character listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPage {
  #[serde(default)]
  pub info: PageInfo,
  #[serde(default)]
  pub results: Vec<Character>,
}

/// Why an episode record is a stand-in rather than real data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderKind {
  OfflineUnavailable,
  Timeout,
  Error,
}

/// Episode record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
  pub id: u64,
  pub name: String,
  #[serde(default)]
  pub air_date: String,
  /// Season/episode code such as `S01E03`
  pub episode: String,
  #[serde(default)]
  pub characters: Vec<String>,
  #[serde(default)]
  pub url: String,
  #[serde(default)]
  pub created: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<PlaceholderKind>,
}

impl Episode {
  /// Synthesize a stand-in for an episode that could not be loaded.
  pub fn placeholder(id: &str, url: &str, kind: PlaceholderKind) -> Self {
    let (name, air_date) = match kind {
      PlaceholderKind::OfflineUnavailable => (
        "Episode information unavailable offline",
        "Unknown (offline)",
      ),
      PlaceholderKind::Timeout => ("Episode information timed out", "Unknown (timeout)"),
      PlaceholderKind::Error => ("Episode information unavailable", "Unknown (error)"),
    };

    Self {
      id: id.parse().unwrap_or_default(),
      name: name.to_string(),
      air_date: air_date.to_string(),
      episode: format!("EP{}", id),
      characters: Vec::new(),
      url: url.to_string(),
      created: Utc::now().to_rfc3339(),
      placeholder: Some(kind),
    }
  }

  pub fn is_placeholder(&self) -> bool {
    self.placeholder.is_some()
  }

  /// Digits of the episode code read as one number: `S01E03` is 103.
  pub fn code_number(&self) -> Option<u64> {
    let digits: String = self.episode.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_character_deserializes_api_shape() {
    let value = json!({
      "id": 1,
      "name": "Rick Sanchez",
      "status": "Alive",
      "species": "Human",
      "type": "",
      "gender": "Male",
      "origin": {"name": "Earth (C-137)", "url": "https://rickandmortyapi.com/api/location/1"},
      "location": {"name": "Citadel of Ricks", "url": "https://rickandmortyapi.com/api/location/3"},
      "image": "https://rickandmortyapi.com/api/character/avatar/1.jpeg",
      "episode": ["https://rickandmortyapi.com/api/episode/1"],
      "url": "https://rickandmortyapi.com/api/character/1",
      "created": "2017-11-04T18:48:46.250Z"
    });
    let character: Character = serde_json::from_value(value).unwrap();
    assert_eq!(character.origin.name, "Earth (C-137)");
    assert_eq!(character.episode.len(), 1);
  }

  #[test]
  fn test_listing_page_deserializes() {
    let value = json!({
      "info": {"count": 826, "pages": 42, "next": "https://rickandmortyapi.com/api/character?page=2", "prev": null},
      "results": [{"id": 2, "name": "Morty Smith"}]
    });
    let page: ListingPage = serde_json::from_value(value).unwrap();
    assert_eq!(page.info.pages, 42);
    assert_eq!(page.info.prev, None);
    assert_eq!(page.results[0].name, "Morty Smith");
  }

  #[test]
  fn test_code_number() {
    let mut episode = Episode::placeholder("3", "/episode/3", PlaceholderKind::Error);
    assert_eq!(episode.code_number(), Some(3));
    episode.episode = "S01E03".to_string();
    assert_eq!(episode.code_number(), Some(103));
    episode.episode = "S02E02".to_string();
    assert_eq!(episode.code_number(), Some(202));
    episode.episode = "special".to_string();
    assert_eq!(episode.code_number(), None);
  }

  #[test]
  fn test_placeholder_texts() {
    let offline = Episode::placeholder("7", "https://x/episode/7", PlaceholderKind::OfflineUnavailable);
    assert_eq!(offline.id, 7);
    assert_eq!(offline.episode, "EP7");
    assert_eq!(offline.air_date, "Unknown (offline)");
    assert!(offline.is_placeholder());

    let timeout = Episode::placeholder("7", "https://x/episode/7", PlaceholderKind::Timeout);
    assert_eq!(timeout.name, "Episode information timed out");
  }

  #[test]
  fn test_real_episode_has_no_placeholder_tag() {
    let episode: Episode = serde_json::from_value(json!({
      "id": 28, "name": "The Ricklantis Mixup", "air_date": "September 10, 2017", "episode": "S03E07"
    }))
    .unwrap();
    assert!(!episode.is_placeholder());
    let back = serde_json::to_value(&episode).unwrap();
    assert!(back.get("placeholder").is_none());
  }
}
