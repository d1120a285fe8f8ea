use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::api::cached_client::CharacterDetail;
use crate::api::types::{Character, Episode};
use crate::app::Panel;
use crate::render::{self, truncate};
use crate::ui::renderfns::{notice_line, status_color};

/// Draw a character's attributes and the episodes they appear in
pub fn draw_character_detail(
  frame: &mut Frame,
  area: Rect,
  id: u64,
  panel: &Panel<CharacterDetail>,
  selected_episode: usize,
) {
  let title = match panel {
    Panel::Loading => format!(" Character #{} (loading...) ", id),
    Panel::Failed(_) => format!(" Character #{} (error) ", id),
    Panel::Ready(detail) => format!(" {} (#{}) ", detail.character.data.name, id),
  };

  let block = Block::default()
    .title(title)
    .title_alignment(Alignment::Center)
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Blue));

  let inner = block.inner(area);
  frame.render_widget(block, area);

  let detail = match panel {
    Panel::Loading => {
      let paragraph =
        Paragraph::new("Loading character details...").style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, inner);
      return;
    }
    Panel::Failed(message) => {
      let paragraph = Paragraph::new(format!("{}\n\n{}", message, render::RETRY_HINT))
        .wrap(Wrap { trim: true })
        .style(Style::default().fg(Color::Red));
      frame.render_widget(paragraph, inner);
      return;
    }
    Panel::Ready(detail) => detail,
  };

  let notice = notice_line(&detail.character);
  let attributes = attribute_lines(&detail.character.data);
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(u16::from(notice.is_some())),
      Constraint::Length(attributes.len() as u16),
      Constraint::Min(1), // Episodes
    ])
    .split(inner);

  if let Some(notice) = notice {
    frame.render_widget(Paragraph::new(notice), chunks[0]);
  }
  frame.render_widget(Paragraph::new(attributes), chunks[1]);

  let episodes_block = Block::default()
    .title(format!(" Episodes ({}) ", detail.episodes.len()))
    .borders(Borders::TOP)
    .border_style(Style::default().fg(Color::DarkGray));

  let rows: Vec<Row> = detail.episodes.iter().map(episode_row).collect();
  let widths = [
    Constraint::Length(8),
    Constraint::Min(20),
    Constraint::Length(20),
  ];
  let table = Table::new(rows, widths)
    .block(episodes_block)
    .header(
      Row::new(vec!["Code", "Name", "Air date"])
        .style(Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray));

  let selected = (!detail.episodes.is_empty())
    .then(|| selected_episode.min(detail.episodes.len() - 1));
  let mut state = TableState::default().with_selected(selected);
  frame.render_stateful_widget(table, chunks[2], &mut state);
}

fn attribute_lines(character: &Character) -> Vec<Line<'static>> {
  let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

  let mut lines = vec![Line::from(vec![
    label("Status:   "),
    Span::styled(
      character.status.clone(),
      Style::default().fg(status_color(&character.status)),
    ),
  ])];
  lines.push(Line::from(vec![
    label("Species:  "),
    Span::raw(character.species.clone()),
  ]));
  if !character.kind.is_empty() {
    lines.push(Line::from(vec![label("Type:     "), Span::raw(character.kind.clone())]));
  }
  lines.push(Line::from(vec![
    label("Gender:   "),
    Span::raw(character.gender.clone()),
  ]));
  lines.push(Line::from(vec![
    label("Origin:   "),
    Span::raw(character.origin.name.clone()),
  ]));
  lines.push(Line::from(vec![
    label("Location: "),
    Span::raw(character.location.name.clone()),
  ]));
  lines
}

fn episode_row(episode: &Episode) -> Row<'static> {
  let style = if episode.is_placeholder() {
    Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC)
  } else {
    Style::default()
  };
  Row::new(vec![
    Cell::from(episode.episode.clone()).style(Style::default().fg(Color::Cyan)),
    Cell::from(truncate(&episode.name, 50)),
    Cell::from(episode.air_date.clone()),
  ])
  .style(style)
}
