use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::api::types::ListingPage;
use crate::app::Panel;
use crate::cache::CacheResult;
use crate::render::{self, truncate};
use crate::session::BrowseSession;
use crate::ui::renderfns::{notice_line, page_bar, status_color};

/// Draw one page of characters as a table, with the cache banner above it
/// and the page bar below.
pub fn draw_character_list(
  frame: &mut Frame,
  area: Rect,
  panel: &Panel<CacheResult<ListingPage>>,
  session: &BrowseSession,
  selected: usize,
) {
  let title = match panel {
    Panel::Loading => format!(" Characters [{}] (loading...) ", session.filters()),
    Panel::Failed(_) => format!(" Characters [{}] (error) ", session.filters()),
    Panel::Ready(result) => format!(
      " Characters [{}] ({} results) ",
      session.filters(),
      result.data.info.count
    ),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let result = match panel {
    Panel::Loading => {
      let paragraph = Paragraph::new("Loading characters...")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }
    Panel::Failed(message) => {
      let paragraph = Paragraph::new(format!("{}\n\n{}", message, render::RETRY_HINT))
        .block(block)
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, area);
      return;
    }
    Panel::Ready(result) => result,
  };

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let notice = notice_line(result);
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(u16::from(notice.is_some())), // Cache banner
      Constraint::Min(1),                              // Table
      Constraint::Length(1),                           // Page bar
    ])
    .split(inner);

  if let Some(notice) = notice {
    frame.render_widget(Paragraph::new(notice), chunks[0]);
  }

  let characters = &result.data.results;
  if characters.is_empty() {
    let paragraph = Paragraph::new("No characters found\nTry adjusting your search or filters.")
      .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(paragraph, chunks[1]);
  } else {
    let header = Row::new(vec!["ID", "Name", "Status", "Species", "Gender"])
      .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD));

    let rows: Vec<Row> = characters
      .iter()
      .map(|character| {
        Row::new(vec![
          Cell::from(character.id.to_string()).style(Style::default().fg(Color::Cyan)),
          Cell::from(truncate(&character.name, 40)),
          Cell::from(character.status.clone())
            .style(Style::default().fg(status_color(&character.status))),
          Cell::from(truncate(&character.species, 16)),
          Cell::from(character.gender.clone()),
        ])
      })
      .collect();

    let widths = [
      Constraint::Length(5),
      Constraint::Min(20),
      Constraint::Length(8),
      Constraint::Length(16),
      Constraint::Length(11),
    ];
    let table = Table::new(rows, widths)
      .header(header)
      .row_highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    let mut state = TableState::default().with_selected(Some(selected.min(characters.len() - 1)));
    frame.render_stateful_widget(table, chunks[1], &mut state);
  }

  let pages = Paragraph::new(page_bar(&session.page_window())).alignment(Alignment::Center);
  frame.render_widget(pages, chunks[2]);
}
