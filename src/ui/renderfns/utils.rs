use chrono::Utc;
use ratatui::prelude::*;

use crate::cache::CacheResult;
use crate::render;
use crate::session::PageItem;

/// Display color for a character status
pub fn status_color(status: &str) -> Color {
  match status {
    "Alive" => Color::Green,
    "Dead" => Color::Red,
    _ => Color::DarkGray,
  }
}

/// The cache banner for data that did not come straight from the network
pub fn notice_line<T>(result: &CacheResult<T>) -> Option<Line<'static>> {
  let notice = render::cache_notice(result.source)?;
  let text = match result.cached_at {
    Some(at) => format!(" {} (cached {}) ", notice, render::age(at, Utc::now())),
    None => format!(" {} ", notice),
  };
  Some(Line::from(Span::styled(
    text,
    Style::default().fg(Color::Black).bg(Color::Yellow),
  )))
}

/// Page numbers with the current page highlighted
pub fn page_bar(items: &[PageItem]) -> Line<'static> {
  let mut spans = vec![Span::styled("Page ", Style::default().fg(Color::DarkGray))];
  for item in items {
    let span = match item {
      PageItem::Current(n) => Span::styled(
        format!("[{}]", n),
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
      ),
      PageItem::Page(n) => Span::styled(n.to_string(), Style::default().fg(Color::White)),
      PageItem::Ellipsis => Span::styled("...", Style::default().fg(Color::DarkGray)),
    };
    spans.push(span);
    spans.push(Span::raw(" "));
  }
  spans.pop();
  Line::from(spans)
}

/// A rectangle centered in `area`, sized in percent
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let width = area.width * percent_x / 100;
  let height = area.height * percent_y / 100;
  Rect::new(
    area.x + (area.width - width) / 2,
    area.y + (area.height - height) / 2,
    width,
    height,
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheSource;

  #[test]
  fn test_status_color() {
    assert_eq!(status_color("Alive"), Color::Green);
    assert_eq!(status_color("Dead"), Color::Red);
    assert_eq!(status_color("unknown"), Color::DarkGray);
  }

  #[test]
  fn test_page_bar_text() {
    let line = page_bar(&[
      PageItem::Page(1),
      PageItem::Ellipsis,
      PageItem::Current(5),
      PageItem::Page(6),
    ]);
    assert_eq!(line.to_string(), "Page 1 ... [5] 6");
  }

  #[test]
  fn test_notice_only_for_cached_data() {
    let fresh = CacheResult::from_network(());
    assert!(notice_line(&fresh).is_none());

    let offline = CacheResult::from_cache((), Utc::now(), true);
    let line = notice_line(&offline).unwrap().to_string();
    assert_eq!(line, " Offline mode: Showing cached data (cached just now) ");
    assert_eq!(offline.source, CacheSource::Offline);
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 50);
    assert_eq!(centered_rect(60, 80, area), Rect::new(20, 5, 60, 40));
  }
}
