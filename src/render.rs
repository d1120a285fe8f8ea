//! Plain-text rendering for one-shot output, plus the user-facing
//! messages the interactive browser shares.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::api::cached_client::CharacterDetail;
use crate::api::types::{Character, Episode, ListingPage};
use crate::cache::{CacheResult, CacheSource, CacheStats};
use crate::commands::COMMANDS;
use crate::connectivity::ConnectivityState;
use crate::error::ResolveError;
use crate::session::{BrowseSession, PageItem};

pub const RETRY_HINT: &str = "Press 'r' to retry.";

/// Which view an error belongs to; the wording differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
  Listing,
  Detail,
}

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Banner shown above data that did not come straight from the network.
pub fn cache_notice(source: CacheSource) -> Option<&'static str> {
  match source {
    CacheSource::Network => None,
    CacheSource::Cache => Some("Showing cached data"),
    CacheSource::Offline => Some("Offline mode: Showing cached data"),
    CacheSource::Degraded => Some("Network error. Showing cached data."),
  }
}

/// How long ago an entry was cached, in words.
pub fn age(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let minutes = (now - cached_at).num_minutes();
  match minutes {
    i64::MIN..=0 => "just now".to_string(),
    1..=59 => format!("{} min ago", minutes),
    _ => format!("{} h ago", minutes / 60),
  }
}

fn notice_line<T>(out: &mut String, result: &CacheResult<T>) {
  if let Some(notice) = cache_notice(result.source) {
    match result.cached_at {
      Some(at) => {
        let _ = writeln!(out, "[{}, cached {}]", notice, age(at, Utc::now()));
      }
      None => {
        let _ = writeln!(out, "[{}]", notice);
      }
    }
  }
}

pub fn page_bar(items: &[PageItem]) -> String {
  items
    .iter()
    .map(|item| match item {
      PageItem::Page(n) => n.to_string(),
      PageItem::Current(n) => format!("[{}]", n),
      PageItem::Ellipsis => "...".to_string(),
    })
    .collect::<Vec<_>>()
    .join(" ")
}

fn character_row(character: &Character) -> String {
  format!(
    "{:>5}  {:<28}  {:<8}  {:<12}  {}",
    character.id,
    truncate(&character.name, 28),
    character.status,
    truncate(&character.species, 12),
    character.gender
  )
}

/// One page of characters with its notice, filters and page bar.
pub fn listing(result: &CacheResult<ListingPage>, session: &BrowseSession) -> String {
  let mut out = String::new();
  notice_line(&mut out, result);

  let page = &result.data;
  let _ = writeln!(
    out,
    "Characters ({}) | {} results | page {} of {}",
    session.filters(),
    page.info.count,
    session.page(),
    session.total_pages()
  );

  if page.results.is_empty() {
    out.push_str("No characters found\nTry adjusting your search or filters.\n");
    return out;
  }

  let _ = writeln!(
    out,
    "{:>5}  {:<28}  {:<8}  {:<12}  {}",
    "ID", "NAME", "STATUS", "SPECIES", "GENDER"
  );
  for character in &page.results {
    out.push_str(&character_row(character));
    out.push('\n');
  }
  let _ = writeln!(out, "Pages: {}", page_bar(&session.page_window()));
  out
}

fn episode_row(episode: &Episode) -> String {
  format!(
    "  {:<7} {:<40} {}",
    episode.episode,
    truncate(&episode.name, 40),
    episode.air_date
  )
}

/// Character details followed by the episode list.
pub fn detail(detail: &CharacterDetail) -> String {
  let mut out = String::new();
  notice_line(&mut out, &detail.character);

  let c = &detail.character.data;
  let _ = writeln!(out, "{} (#{})", c.name, c.id);
  let _ = writeln!(out, "  Status:   {}", c.status);
  let _ = writeln!(out, "  Species:  {}", c.species);
  if !c.kind.is_empty() {
    let _ = writeln!(out, "  Type:     {}", c.kind);
  }
  let _ = writeln!(out, "  Gender:   {}", c.gender);
  let _ = writeln!(out, "  Origin:   {}", c.origin.name);
  let _ = writeln!(out, "  Location: {}", c.location.name);
  let _ = writeln!(out, "Episodes ({}):", detail.episodes.len());
  for episode in &detail.episodes {
    out.push_str(&episode_row(episode));
    out.push('\n');
  }
  out
}

/// User-facing message for a failed load.
pub fn error_message(error: &ResolveError, view: View) -> String {
  match (error, view) {
    (ResolveError::OfflineNoData, View::Listing) => {
      "You are offline and this data is not in the cache. Connect to the internet and try again."
        .to_string()
    }
    (ResolveError::OfflineNoData, View::Detail) => {
      "Cannot load character details while offline".to_string()
    }
    (ResolveError::Timeout, _) => "Request timed out. Check your internet connection.".to_string(),
    (ResolveError::Network(_), View::Listing) => {
      "Error fetching characters. Please try again later.".to_string()
    }
    (ResolveError::Network(_), View::Detail) => {
      "Failed to load character details. Please try again.".to_string()
    }
    (ResolveError::Api(message), _) => message.clone(),
  }
}

pub fn stats(stats: &CacheStats) -> String {
  format!(
    "Cache: {} listings, {} characters, {} episodes ({} total) | {} hits, {} misses",
    stats.listings,
    stats.details,
    stats.episodes,
    stats.total(),
    stats.hits,
    stats.misses
  )
}

pub fn connectivity(state: ConnectivityState, forced: bool) -> String {
  match (state, forced) {
    (_, true) => "Offline (forced)".to_string(),
    (ConnectivityState::Online, _) => "Online".to_string(),
    (ConnectivityState::Offline, _) => "Offline".to_string(),
  }
}

/// Message for a connectivity transition. Coming back online while cached
/// data is on screen offers a refresh.
pub fn transition(state: ConnectivityState, showing_cached: bool) -> String {
  match state {
    ConnectivityState::Online if showing_cached => {
      "You're back online! Would you like to refresh for the latest data? Press 'r' to refresh."
        .to_string()
    }
    ConnectivityState::Online => "You're back online!".to_string(),
    ConnectivityState::Offline => {
      "You are offline. Cached data is still available.".to_string()
    }
  }
}

pub fn help() -> String {
  let mut out = String::from("Commands:\n");
  for cmd in COMMANDS {
    let _ = writeln!(out, "  {:<40} {}", cmd.usage, cmd.description);
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::types::{NamedRef, PageInfo, PlaceholderKind};
  use chrono::Duration;

  fn character(id: u64, name: &str) -> Character {
    Character {
      id,
      name: name.to_string(),
      status: "Alive".to_string(),
      species: "Human".to_string(),
      kind: String::new(),
      gender: "Male".to_string(),
      origin: NamedRef {
        name: "Earth (C-137)".to_string(),
        url: String::new(),
      },
      location: NamedRef {
        name: "Citadel of Ricks".to_string(),
        url: String::new(),
      },
      image: String::new(),
      episode: Vec::new(),
      url: String::new(),
      created: String::new(),
    }
  }

  fn page(names: &[&str], pages: u32) -> ListingPage {
    ListingPage {
      info: PageInfo {
        count: names.len() as u64,
        pages,
        next: None,
        prev: None,
      },
      results: names
        .iter()
        .enumerate()
        .map(|(i, n)| character(i as u64 + 1, n))
        .collect(),
    }
  }

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Señor Señorita", 8), "Señor...");
  }

  #[test]
  fn test_cache_notices() {
    assert_eq!(cache_notice(CacheSource::Network), None);
    assert_eq!(cache_notice(CacheSource::Cache), Some("Showing cached data"));
    assert_eq!(
      cache_notice(CacheSource::Offline),
      Some("Offline mode: Showing cached data")
    );
    assert_eq!(
      cache_notice(CacheSource::Degraded),
      Some("Network error. Showing cached data.")
    );
  }

  #[test]
  fn test_age() {
    let now = Utc::now();
    assert_eq!(age(now, now), "just now");
    assert_eq!(age(now - Duration::minutes(12), now), "12 min ago");
    assert_eq!(age(now - Duration::minutes(150), now), "2 h ago");
  }

  #[test]
  fn test_listing_with_offline_notice() {
    let mut session = BrowseSession::default();
    let data = page(&["Rick Sanchez", "Morty Smith"], 3);
    session.update_from(&data.info, true);
    let result = CacheResult::from_cache(data, Utc::now(), true);

    let text = listing(&result, &session);
    assert!(text.starts_with("[Offline mode: Showing cached data, cached just now]"));
    assert!(text.contains("Rick Sanchez"));
    assert!(text.contains("Pages: [1] 2 3"));
  }

  #[test]
  fn test_empty_listing() {
    let session = BrowseSession::default();
    let result = CacheResult::from_network(page(&[], 1));
    let text = listing(&result, &session);
    assert!(text.contains("No characters found"));
    assert!(!text.contains("Showing cached data"));
  }

  #[test]
  fn test_detail_lists_episodes() {
    let detail_view = CharacterDetail {
      character: CacheResult::from_network(character(1, "Rick Sanchez")),
      episodes: vec![Episode::placeholder(
        "7",
        "/episode/7",
        PlaceholderKind::OfflineUnavailable,
      )],
    };
    let text = detail(&detail_view);
    assert!(text.starts_with("Rick Sanchez (#1)"));
    assert!(text.contains("Episodes (1):"));
    assert!(text.contains("EP7"));
    assert!(text.contains("Unknown (offline)"));
  }

  #[test]
  fn test_error_messages() {
    assert_eq!(
      error_message(&ResolveError::OfflineNoData, View::Listing),
      "You are offline and this data is not in the cache. Connect to the internet and try again."
    );
    assert_eq!(
      error_message(&ResolveError::OfflineNoData, View::Detail),
      "Cannot load character details while offline"
    );
    assert_eq!(
      error_message(&ResolveError::Timeout, View::Listing),
      "Request timed out. Check your internet connection."
    );
    assert_eq!(
      error_message(&ResolveError::Network("reset".into()), View::Listing),
      "Error fetching characters. Please try again later."
    );
    assert_eq!(
      error_message(&ResolveError::Api("There is nothing here".into()), View::Listing),
      "There is nothing here"
    );
  }

  #[test]
  fn test_transition_prompts_refresh_only_over_cached_data() {
    assert!(transition(ConnectivityState::Online, true).contains("refresh"));
    assert_eq!(transition(ConnectivityState::Online, false), "You're back online!");
  }

  #[test]
  fn test_help_lists_every_command() {
    let text = help();
    assert!(COMMANDS.iter().all(|c| text.contains(c.usage)));
  }
}
