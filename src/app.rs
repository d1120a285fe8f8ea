use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::debug;

use crate::api::cached_client::{CachedCatalogClient, CharacterDetail};
use crate::api::types::ListingPage;
use crate::cache::CacheResult;
use crate::commands::{self, BrowseCommand};
use crate::connectivity::ConnectivityState;
use crate::event::{Event, EventHandler};
use crate::render::{self, View};
use crate::session::BrowseSession;
use crate::ui;
use crate::ui::components::{CommandEvent, CommandInput, KeyResult};

const TICK_RATE: Duration = Duration::from_millis(250);

/// What is currently on screen; `retry` reloads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Listing,
  Detail(u64),
}

/// A load the event loop runs before waiting for the next event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Load {
  Listing,
  Detail(u64),
}

/// Content of one view
#[derive(Debug)]
pub enum Panel<T> {
  Loading,
  Ready(T),
  /// User-facing error text
  Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
  Info,
  Error,
}

/// One line of feedback in the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  pub text: String,
  pub kind: MessageKind,
}

/// Interactive browser
pub struct App {
  client: CachedCatalogClient,
  session: BrowseSession,
  screen: Screen,

  listing: Panel<CacheResult<ListingPage>>,
  detail: Panel<CharacterDetail>,
  /// Highlighted row of the listing
  selected: usize,
  /// Highlighted row of the episode table
  selected_episode: usize,

  command: CommandInput,
  message: Option<Message>,
  show_help: bool,
  pending: Option<Load>,
  should_quit: bool,
}

impl App {
  pub fn new(client: CachedCatalogClient, session: BrowseSession) -> Self {
    let mut app = Self {
      client,
      session,
      screen: Screen::Listing,
      listing: Panel::Loading,
      detail: Panel::Loading,
      selected: 0,
      selected_episode: 0,
      command: CommandInput::default(),
      message: None,
      show_help: false,
      pending: None,
      should_quit: false,
    };
    app.request(Load::Listing);
    app
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn event_loop(
    &mut self,
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
  ) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    events.watch_connectivity(self.client.connectivity().subscribe());

    // Main loop
    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Draw the loading state first, then run the load
      if self.pending.is_some() {
        self.load_pending().await;
        continue;
      }

      match events.next().await {
        Some(Event::Key(key)) => self.handle_key(key),
        Some(Event::Tick) => {} // Redraw refreshes cache ages
        Some(Event::Connectivity(state)) => self.handle_connectivity(state),
        None => break,
      }
    }

    Ok(())
  }

  pub fn client(&self) -> &CachedCatalogClient {
    &self.client
  }

  pub fn session(&self) -> &BrowseSession {
    &self.session
  }

  pub fn screen(&self) -> Screen {
    self.screen
  }

  pub fn listing(&self) -> &Panel<CacheResult<ListingPage>> {
    &self.listing
  }

  pub fn detail(&self) -> &Panel<CharacterDetail> {
    &self.detail
  }

  pub fn selected(&self) -> usize {
    self.selected
  }

  pub fn selected_episode(&self) -> usize {
    self.selected_episode
  }

  pub fn command(&self) -> &CommandInput {
    &self.command
  }

  pub fn message(&self) -> Option<&Message> {
    self.message.as_ref()
  }

  pub fn showing_help(&self) -> bool {
    self.show_help
  }

  pub fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }
    if self.show_help {
      self.show_help = false;
      return;
    }

    match self.command.handle_key(key) {
      KeyResult::Event(CommandEvent::Submitted(line)) => {
        self.execute(&line);
        return;
      }
      KeyResult::Event(CommandEvent::Cancelled) | KeyResult::Handled => return,
      KeyResult::NotHandled => {}
    }

    match self.screen {
      Screen::Listing => self.handle_listing_key(key),
      Screen::Detail(_) => self.handle_detail_key(key),
    }
  }

  fn handle_listing_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        let count = self.listed_count();
        if count > 0 {
          self.selected = (self.selected + 1).min(count - 1);
        }
      }
      KeyCode::Char('k') | KeyCode::Up => self.selected = self.selected.saturating_sub(1),
      KeyCode::Enter => {
        if let Panel::Ready(result) = &self.listing {
          if let Some(character) = result.data.results.get(self.selected) {
            let id = character.id;
            self.request(Load::Detail(id));
          }
        }
      }
      KeyCode::Char('n') | KeyCode::Right => self.run_command(BrowseCommand::Next),
      KeyCode::Char('p') | KeyCode::Left => self.run_command(BrowseCommand::Prev),
      KeyCode::Char('r') => self.run_command(BrowseCommand::Retry),
      KeyCode::Char('/') => self.command.activate_with("search "),
      KeyCode::Char('?') => self.show_help = true,
      KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
      _ => {}
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => {
        if let Panel::Ready(detail) = &self.detail {
          let count = detail.episodes.len();
          if count > 0 {
            self.selected_episode = (self.selected_episode + 1).min(count - 1);
          }
        }
      }
      KeyCode::Char('k') | KeyCode::Up => {
        self.selected_episode = self.selected_episode.saturating_sub(1)
      }
      KeyCode::Char('r') => self.run_command(BrowseCommand::Retry),
      KeyCode::Char('?') => self.show_help = true,
      // Back to the listing already loaded
      KeyCode::Char('q') | KeyCode::Esc | KeyCode::Backspace => {
        self.screen = Screen::Listing;
        self.message = None;
      }
      _ => {}
    }
  }

  fn listed_count(&self) -> usize {
    match &self.listing {
      Panel::Ready(result) => result.data.results.len(),
      _ => 0,
    }
  }

  /// Parse and run one command bar line.
  pub fn execute(&mut self, line: &str) {
    if line.trim().is_empty() {
      return;
    }
    match commands::parse(line) {
      Ok(command) => self.run_command(command),
      Err(text) => self.show(MessageKind::Error, text),
    }
  }

  fn run_command(&mut self, command: BrowseCommand) {
    debug!(?command, "Browse command");
    self.message = None;
    match command {
      BrowseCommand::Next => {
        if self.session.next() {
          self.request(Load::Listing);
        } else {
          self.show(MessageKind::Info, "Already on the last page");
        }
      }
      BrowseCommand::Prev => {
        if self.session.prev() {
          self.request(Load::Listing);
        } else {
          self.show(MessageKind::Info, "Already on the first page");
        }
      }
      BrowseCommand::Page(page) => match self.session.go_to(page) {
        Ok(()) => self.request(Load::Listing),
        Err(text) => self.show(MessageKind::Error, text),
      },
      BrowseCommand::Search(name) => {
        self.session.set_name(&name);
        self.request(Load::Listing);
      }
      BrowseCommand::Status(status) => {
        self.session.set_status(status);
        self.request(Load::Listing);
      }
      BrowseCommand::Gender(gender) => {
        self.session.set_gender(gender);
        self.request(Load::Listing);
      }
      BrowseCommand::Reset => {
        self.session.reset();
        self.request(Load::Listing);
      }
      BrowseCommand::Show(id) => self.request(Load::Detail(id)),
      BrowseCommand::Retry => match self.screen {
        Screen::Listing => self.request(Load::Listing),
        Screen::Detail(id) => self.request(Load::Detail(id)),
      },
      BrowseCommand::Stats => {
        let text = render::stats(&self.client.store().stats());
        self.show(MessageKind::Info, text);
      }
      BrowseCommand::Clear(namespace) => {
        self.client.store().clear(namespace);
        let text = match namespace {
          Some(ns) => format!("Cleared {} cache", ns.label()),
          None => "Cleared all cached data".to_string(),
        };
        self.show(MessageKind::Info, text);
      }
      BrowseCommand::Online => {
        let text = render::connectivity(
          self.client.connectivity().state(),
          self.client.connectivity().is_forced_offline(),
        );
        self.show(MessageKind::Info, text);
      }
      BrowseCommand::Help => self.show_help = true,
      BrowseCommand::Quit => self.should_quit = true,
    }
  }

  /// Show the transition in the status bar. Coming back online over cached
  /// data offers a refresh.
  pub fn handle_connectivity(&mut self, state: ConnectivityState) {
    let showing_cached = match self.screen {
      Screen::Listing => self.session.showing_cached(),
      Screen::Detail(_) => false,
    };
    let kind = match state {
      ConnectivityState::Online => MessageKind::Info,
      ConnectivityState::Offline => MessageKind::Error,
    };
    self.show(kind, render::transition(state, showing_cached));
  }

  fn show(&mut self, kind: MessageKind, text: impl Into<String>) {
    self.message = Some(Message {
      text: text.into(),
      kind,
    });
  }

  /// Switch to the view and mark it loading; the event loop runs the load.
  fn request(&mut self, load: Load) {
    match load {
      Load::Listing => {
        self.screen = Screen::Listing;
        self.listing = Panel::Loading;
      }
      Load::Detail(id) => {
        self.screen = Screen::Detail(id);
        self.detail = Panel::Loading;
        self.selected_episode = 0;
      }
    }
    self.pending = Some(load);
  }

  async fn load_pending(&mut self) {
    match self.pending.take() {
      Some(Load::Listing) => self.load_listing().await,
      Some(Load::Detail(id)) => self.load_detail(id).await,
      None => {}
    }
  }

  async fn load_listing(&mut self) {
    let page = self.session.page();
    let filters = self.session.filters().clone();

    self.listing = match self.client.characters(page, &filters).await {
      Ok(result) => {
        self
          .session
          .update_from(&result.data.info, result.is_cached());
        self.selected = 0;
        Panel::Ready(result)
      }
      Err(e) => {
        self.session.clear_showing_cached();
        Panel::Failed(render::error_message(&e, View::Listing))
      }
    };
  }

  async fn load_detail(&mut self, id: u64) {
    self.detail = match self.client.character_with_episodes(id).await {
      Ok(detail) => Panel::Ready(detail),
      Err(e) => Panel::Failed(render::error_message(&e, View::Detail)),
    };
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::query::Status;
  use crate::resolve::fixtures::{character, episode, listing, Harness, BASE};
  use ratatui::backend::TestBackend;

  fn app(h: &Harness) -> App {
    let client = CachedCatalogClient::new(h.api.clone(), h.store.clone(), h.connectivity.clone());
    App::new(client, BrowseSession::default())
  }

  fn page_url(query: &str) -> String {
    format!("{}/character{}", BASE, query)
  }

  async fn press(app: &mut App, code: KeyCode) {
    app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    app.load_pending().await;
  }

  async fn command(app: &mut App, line: &str) {
    press(app, KeyCode::Char(':')).await;
    for c in line.chars() {
      press(app, KeyCode::Char(c)).await;
    }
    press(app, KeyCode::Enter).await;
  }

  fn names(app: &App) -> Vec<String> {
    match app.listing() {
      Panel::Ready(result) => result.data.results.iter().map(|c| c.name.clone()).collect(),
      other => panic!("listing not ready: {:?}", other),
    }
  }

  fn message_text(app: &App) -> &str {
    app.message().map(|m| m.text.as_str()).unwrap_or_default()
  }

  fn screen_text(app: &App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| ui::draw(frame, app)).unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  #[tokio::test]
  async fn test_paging_through_listing() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez", "Morty Smith"], 2));
    h.transport
      .ok(&page_url("?page=2"), listing(&["Summer Smith"], 2));
    let mut app = app(&h);
    assert!(matches!(app.listing(), Panel::Loading));

    app.load_pending().await;
    assert_eq!(names(&app), vec!["Rick Sanchez", "Morty Smith"]);

    press(&mut app, KeyCode::Char('n')).await;
    assert_eq!(names(&app), vec!["Summer Smith"]);
    assert_eq!(app.session().page(), 2);
    press(&mut app, KeyCode::Right).await;
    assert_eq!(message_text(&app), "Already on the last page");

    // Page 1 again comes from the cache
    press(&mut app, KeyCode::Char('p')).await;
    assert!(app.session().showing_cached());
    assert_eq!(h.transport.call_count(&page_url("?page=1")), 1);
  }

  #[tokio::test]
  async fn test_command_bar_filters_reset_to_first_page() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez"], 3));
    h.transport
      .ok(&page_url("?page=3"), listing(&["Rick Sanchez"], 3));
    h.transport.ok(
      &page_url("?page=1&name=rick&status=alive"),
      listing(&["Rick Sanchez"], 1),
    );
    h.transport
      .ok(&page_url("?page=1&name=rick"), listing(&["Rick Sanchez"], 1));
    let mut app = app(&h);
    app.load_pending().await;

    command(&mut app, "page 3").await;
    assert_eq!(app.session().page(), 3);

    command(&mut app, "search rick").await;
    assert_eq!(app.session().page(), 1);
    command(&mut app, "status alive").await;
    assert_eq!(app.session().filters().status, Some(Status::Alive));
    assert_eq!(
      h.transport
        .call_count(&page_url("?page=1&name=rick&status=alive")),
      1
    );
  }

  #[tokio::test]
  async fn test_slash_opens_search() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez"], 1));
    h.transport
      .ok(&page_url("?page=1&name=morty"), listing(&["Morty Smith"], 1));
    let mut app = app(&h);
    app.load_pending().await;

    press(&mut app, KeyCode::Char('/')).await;
    assert_eq!(app.command().value(), "search ");
    for c in "morty".chars() {
      press(&mut app, KeyCode::Char(c)).await;
    }
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(names(&app), vec!["Morty Smith"]);
  }

  #[tokio::test]
  async fn test_offline_errors() {
    let h = Harness::new();
    h.go_offline();
    let mut app = app(&h);
    app.load_pending().await;

    match app.listing() {
      Panel::Failed(text) => {
        assert!(text.starts_with("You are offline and this data is not in the cache."))
      }
      other => panic!("expected failure, got {:?}", other),
    }

    command(&mut app, "show 1").await;
    assert_eq!(app.screen(), Screen::Detail(1));
    match app.detail() {
      Panel::Failed(text) => assert_eq!(text, "Cannot load character details while offline"),
      other => panic!("expected failure, got {:?}", other),
    }
    assert!(screen_text(&app).contains(render::RETRY_HINT));
    assert!(h.transport.calls().is_empty());
  }

  #[tokio::test]
  async fn test_enter_opens_selected_character() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez", "Morty Smith"], 1));
    h.transport
      .ok(&format!("{}/character/2", BASE), character(2, "Morty Smith"));
    h.transport.ok(&format!("{}/episode/1", BASE), episode(1, "S01E01"));
    h.transport.ok(&format!("{}/episode/2", BASE), episode(2, "S01E02"));
    let mut app = app(&h);
    app.load_pending().await;

    press(&mut app, KeyCode::Char('j')).await;
    press(&mut app, KeyCode::Enter).await;
    assert_eq!(app.screen(), Screen::Detail(2));
    match app.detail() {
      Panel::Ready(detail) => {
        assert_eq!(detail.character.data.name, "Morty Smith");
        assert_eq!(detail.episodes.len(), 2);
      }
      other => panic!("detail not ready: {:?}", other),
    }
    let text = screen_text(&app);
    assert!(text.contains("Morty Smith (#2)"));
    assert!(text.contains("S01E02"));

    // Back to the listing without refetching it
    press(&mut app, KeyCode::Char('q')).await;
    assert_eq!(app.screen(), Screen::Listing);
    assert_eq!(h.transport.call_count(&page_url("?page=1")), 1);
    assert!(!app.should_quit);
  }

  #[tokio::test]
  async fn test_listing_screen_shows_table_and_cache_banner() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez"], 42));
    let mut app = app(&h);
    app.load_pending().await;

    let text = screen_text(&app);
    assert!(text.contains("Rick Sanchez"));
    assert!(text.contains("Page [1] 2 3 4 5 ... 42"));
    assert!(!text.contains("Showing cached data"));

    h.go_offline();
    press(&mut app, KeyCode::Char('r')).await;
    assert!(screen_text(&app).contains("Offline mode: Showing cached data"));
  }

  #[tokio::test]
  async fn test_back_online_prompt_over_cached_listing() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez"], 1));
    let mut app = app(&h);
    app.load_pending().await;
    app.handle_connectivity(ConnectivityState::Online);
    assert_eq!(message_text(&app), "You're back online!");

    h.go_offline();
    press(&mut app, KeyCode::Char('r')).await;
    assert!(app.session().showing_cached());
    app.handle_connectivity(ConnectivityState::Online);
    assert!(message_text(&app).contains("refresh for the latest data"));
  }

  #[tokio::test]
  async fn test_cache_commands() {
    let h = Harness::new();
    h.transport
      .ok(&page_url("?page=1"), listing(&["Rick Sanchez"], 1));
    let mut app = app(&h);
    app.load_pending().await;

    command(&mut app, "stats").await;
    assert!(message_text(&app).starts_with("Cache: 1 listings"));
    command(&mut app, "clear listing").await;
    assert_eq!(message_text(&app), "Cleared listing cache");
    assert_eq!(h.store.stats().listings, 0);
    command(&mut app, "online").await;
    assert_eq!(message_text(&app), "Online");
  }

  #[tokio::test]
  async fn test_bad_commands_help_and_quit() {
    let h = Harness::new();
    let mut app = app(&h);

    command(&mut app, "frobnicate").await;
    assert!(message_text(&app).starts_with("Unknown command"));
    assert_eq!(app.message().map(|m| m.kind), Some(MessageKind::Error));
    command(&mut app, "re").await;
    assert!(message_text(&app).starts_with("Ambiguous command 're'"));

    press(&mut app, KeyCode::Char('?')).await;
    assert!(app.showing_help());
    assert!(screen_text(&app).contains("Help (any key closes)"));
    press(&mut app, KeyCode::Char('x')).await;
    assert!(!app.showing_help());

    app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
  }
}
