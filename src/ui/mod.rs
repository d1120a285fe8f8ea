pub mod components;
mod renderfns;
mod views;

use crate::app::{App, MessageKind, Screen};
use crate::commands;
use crate::render;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

const KEY_HELP: &str = "Keys:
  j/k, Up/Down    move selection
  Enter           open the selected character
  n/p, Right/Left next or previous page
  /               search by name
  r               retry the current view
  :               command bar (Tab completes)
  q, Esc          back, or quit from the listing
  Ctrl-C          quit";

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

  let connectivity = app.client().connectivity();
  renderfns::draw_header(
    frame,
    chunks[0],
    connectivity.state(),
    connectivity.is_forced_offline(),
    &app.client().store().stats(),
  );

  match app.screen() {
    Screen::Listing => views::draw_character_list(
      frame,
      chunks[1],
      app.listing(),
      app.session(),
      app.selected(),
    ),
    Screen::Detail(id) => {
      views::draw_character_detail(frame, chunks[1], id, app.detail(), app.selected_episode())
    }
  }

  draw_status_bar(frame, chunks[2], app);

  app.command().render_overlay(frame, chunks[1]);
  if app.showing_help() {
    draw_help(frame, chunks[1]);
  }
}

fn draw_status_bar(frame: &mut Frame, area: Rect, app: &App) {
  let (content, style) = if app.command().is_active() {
    (command_hint(app.command().value()), Style::default().fg(Color::Yellow))
  } else if let Some(message) = app.message() {
    let color = match message.kind {
      MessageKind::Info => Color::Cyan,
      MessageKind::Error => Color::Red,
    };
    (format!(" {}", message.text), Style::default().fg(color))
  } else {
    let hint = match app.screen() {
      Screen::Listing => " j/k:nav  Enter:open  n/p:page  /:search  r:retry  ?:help  q:quit",
      Screen::Detail(_) => " j/k:episodes  r:retry  q:back  ?:help",
    };
    (hint.to_string(), Style::default().fg(Color::DarkGray))
  };

  let paragraph = Paragraph::new(content).style(style);
  frame.render_widget(paragraph, area);
}

/// Usage of the command being typed, once the command word is known
fn command_hint(value: &str) -> String {
  let word = value.split_whitespace().next().unwrap_or_default();
  match commands::get_suggestions(word).first() {
    Some(cmd) if !word.is_empty() => {
      format!(" {}  (Tab: complete, Enter: run, Esc: cancel)", cmd.usage)
    }
    _ => " Tab: complete, Enter: run, Esc: cancel".to_string(),
  }
}

fn draw_help(frame: &mut Frame, area: Rect) {
  let popup = renderfns::centered_rect(80, 90, area);
  frame.render_widget(Clear, popup);

  let block = Block::default()
    .title(" Help (any key closes) ")
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));
  let text = format!("{}\n{}", render::help(), KEY_HELP);
  let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
  frame.render_widget(paragraph, popup);
}
