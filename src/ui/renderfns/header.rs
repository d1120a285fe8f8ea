use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::cache::CacheStats;
use crate::connectivity::ConnectivityState;

/// Draw the header bar with logo, connection state, cache size and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  state: ConnectivityState,
  forced_offline: bool,
  stats: &CacheStats,
) {
  let (label, color) = connection_label(state, forced_offline);

  let header = Line::from(vec![
    Span::styled(" rickdex ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" ● {} ", label), Style::default().fg(color)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} cached ", stats.total()),
      Style::default().fg(Color::White),
    ),
    Span::raw("  "),
    // Shortcuts - keys highlighted, descriptions dimmed
    Span::styled("<:>", Style::default().fg(Color::Cyan)),
    Span::styled(" command", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("</>", Style::default().fg(Color::Cyan)),
    Span::styled(" search", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<r>", Style::default().fg(Color::Cyan)),
    Span::styled(" retry", Style::default().fg(Color::DarkGray)),
    Span::raw("   "),
    Span::styled("<?>", Style::default().fg(Color::Cyan)),
    Span::styled(" help", Style::default().fg(Color::DarkGray)),
  ]);

  let paragraph = Paragraph::new(header).style(Style::default().bg(Color::Black));

  frame.render_widget(paragraph, area);
}

fn connection_label(state: ConnectivityState, forced_offline: bool) -> (&'static str, Color) {
  match (state, forced_offline) {
    (_, true) => ("offline (forced)", Color::Magenta),
    (ConnectivityState::Online, _) => ("online", Color::Green),
    (ConnectivityState::Offline, _) => ("offline", Color::Red),
  }
}
