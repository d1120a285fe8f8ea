use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Events emitted by command input that parent needs to handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandEvent {
  /// The typed line, arguments included
  Submitted(String),
  Cancelled,
}

/// The `:` command bar with autocomplete on the command word
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn is_active(&self) -> bool {
    self.active
  }

  pub fn value(&self) -> &str {
    self.input.value()
  }

  /// Open the bar with `prefix` already typed
  pub fn activate_with(&mut self, prefix: &str) {
    self.active = true;
    self.input.set(prefix);
    self.selected_suggestion = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  /// Suggestions for the command word. Once arguments are being typed
  /// there is nothing left to complete.
  pub fn suggestions(&self) -> Vec<&'static Command> {
    let value = self.input.value().trim_start();
    if value.contains(char::is_whitespace) {
      return Vec::new();
    }
    commands::get_suggestions(value)
  }

  /// Replace the command word with the highlighted suggestion
  fn complete(&mut self) {
    if let Some(cmd) = self.suggestions().get(self.selected_suggestion) {
      self.input.set(&format!("{} ", cmd.name));
      self.selected_suggestion = 0;
    }
  }

  /// Handle a key event. Call this regardless of active state; `:` opens
  /// the bar.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<CommandEvent> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.activate_with("");
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    match key.code {
      KeyCode::Esc => {
        self.close();
        return KeyResult::Event(CommandEvent::Cancelled);
      }
      KeyCode::Backspace if self.input.is_empty() => {
        self.close();
        return KeyResult::Event(CommandEvent::Cancelled);
      }
      KeyCode::Enter => {
        let line = self.input.value().trim().to_string();
        self.close();
        return KeyResult::Event(CommandEvent::Submitted(line));
      }
      KeyCode::Tab => {
        self.complete();
        return KeyResult::Handled;
      }
      KeyCode::Down => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + 1) % count;
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        let count = self.suggestions().len();
        if count > 0 {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            count - 1
          } else {
            self.selected_suggestion - 1
          };
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    // Delegate to TextInput for text editing
    match self.input.handle_key(key) {
      InputResult::Consumed => {
        self.selected_suggestion = 0; // Reset on input change
        KeyResult::Handled
      }
      InputResult::Submitted(_) | InputResult::Cancelled => KeyResult::Handled,
      // The bar is modal; stray keys do nothing
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Render the command overlay if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let suggestion_count = suggestions.len().min(8) as u16;
    let height = (3 + suggestion_count).min(area.height);

    // Top-left of content area with small margin
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);
    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");

    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([
        Constraint::Length(1), // Input line
        Constraint::Min(0),    // Suggestions
      ])
      .split(inner);

    // Input line with a block cursor
    let value = self.input.value();
    let split = value
      .char_indices()
      .nth(self.input.cursor_position())
      .map(|(i, _)| i)
      .unwrap_or(value.len());
    let (before, after) = value.split_at(split);
    let mut rest = after.chars();
    let under_cursor = rest.next().map(String::from).unwrap_or_else(|| " ".to_string());
    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(before),
      Span::styled(under_cursor, Style::default().add_modifier(Modifier::REVERSED)),
      Span::raw(rest.as_str()),
    ]);
    frame.render_widget(Paragraph::new(input_line), chunks[0]);

    if !suggestions.is_empty() && chunks[1].height > 0 {
      let items: Vec<ListItem> = suggestions
        .iter()
        .take(8)
        .map(|cmd| {
          let line = Line::from(vec![
            Span::styled(format!("{:<10}", cmd.name), Style::default().fg(Color::Cyan)),
            Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
          ]);
          ListItem::new(line)
        })
        .collect();

      let list =
        List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

      let mut state = ListState::default();
      state.select(Some(self.selected_suggestion));

      frame.render_stateful_widget(list, chunks[1], &mut state);
    }
  }
}
