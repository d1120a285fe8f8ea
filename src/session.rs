//! Browsing state: the current page, the total page count from the last
//! listing, and the active filters.

use crate::api::query::{Gender, QueryFilters, Status};
use crate::api::types::PageInfo;

/// One slot of the page bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
  Page(u32),
  Current(u32),
  Ellipsis,
}

/// Number of page numbers shown around the current page.
const WINDOW: u32 = 5;

#[derive(Debug, Clone)]
pub struct BrowseSession {
  page: u32,
  total_pages: u32,
  filters: QueryFilters,
  /// Whether the listing on screen came from the cache
  showing_cached: bool,
}

impl Default for BrowseSession {
  fn default() -> Self {
    Self {
      page: 1,
      total_pages: 1,
      filters: QueryFilters::default(),
      showing_cached: false,
    }
  }
}

impl BrowseSession {
  pub fn new(page: u32, filters: QueryFilters) -> Self {
    Self {
      page: page.max(1),
      filters,
      ..Self::default()
    }
  }

  pub fn page(&self) -> u32 {
    self.page
  }

  pub fn total_pages(&self) -> u32 {
    self.total_pages
  }

  pub fn filters(&self) -> &QueryFilters {
    &self.filters
  }

  pub fn showing_cached(&self) -> bool {
    self.showing_cached
  }

  /// Returns false when already on the last page.
  pub fn next(&mut self) -> bool {
    if self.page >= self.total_pages {
      return false;
    }
    self.page += 1;
    true
  }

  /// Returns false when already on the first page.
  pub fn prev(&mut self) -> bool {
    if self.page <= 1 {
      return false;
    }
    self.page -= 1;
    true
  }

  /// Jump to `page`. Out of range pages are rejected.
  pub fn go_to(&mut self, page: u32) -> Result<(), String> {
    if page == 0 || page > self.total_pages {
      return Err(format!("Page must be between 1 and {}", self.total_pages));
    }
    self.page = page;
    Ok(())
  }

  pub fn set_name(&mut self, name: &str) {
    self.filters.name = name.trim().to_string();
    self.page = 1;
  }

  pub fn set_status(&mut self, status: Option<Status>) {
    self.filters.status = status;
    self.page = 1;
  }

  pub fn set_gender(&mut self, gender: Option<Gender>) {
    self.filters.gender = gender;
    self.page = 1;
  }

  /// Drop every filter and go back to the first page.
  pub fn reset(&mut self) {
    self.filters = QueryFilters::default();
    self.page = 1;
  }

  /// Nothing cached is on screen any more (e.g. the last load failed).
  pub fn clear_showing_cached(&mut self) {
    self.showing_cached = false;
  }

  /// Record the outcome of a listing load.
  pub fn update_from(&mut self, info: &PageInfo, cached: bool) {
    self.total_pages = info.pages.max(1);
    self.page = self.page.min(self.total_pages);
    self.showing_cached = cached;
  }

  /// The page bar: up to five pages around the current one, plus the first
  /// and last pages with ellipses where pages are skipped.
  pub fn page_window(&self) -> Vec<PageItem> {
    let total = self.total_pages;
    let mut start = self.page.saturating_sub(2).max(1);
    let end = total.min(start + WINDOW - 1);
    if end - start < WINDOW - 1 && start > 1 {
      start = end.saturating_sub(WINDOW - 1).max(1);
    }

    let mut items = Vec::new();
    if start > 1 {
      items.push(PageItem::Page(1));
      if start > 2 {
        items.push(PageItem::Ellipsis);
      }
    }
    for page in start..=end {
      if page == self.page {
        items.push(PageItem::Current(page));
      } else {
        items.push(PageItem::Page(page));
      }
    }
    if end < total {
      if end + 1 < total {
        items.push(PageItem::Ellipsis);
      }
      items.push(PageItem::Page(total));
    }
    items
  }
}
