use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::connectivity::ConnectivityState;

/// Application events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
  /// Terminal key press
  Key(KeyEvent),
  /// Periodic tick for UI refresh (cache ages move on)
  Tick,
  /// The connectivity monitor reported a transition
  Connectivity(ConnectivityState),
}

/// Event handler that merges terminal input, a tick timer and connectivity
/// transitions
pub struct EventHandler {
  tx: mpsc::UnboundedSender<Event>,
  rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
  /// Create a new event handler with the given tick rate
  pub fn new(tick_rate: Duration) -> Self {
    let handler = Self::unattached();

    // Spawn terminal event reader; poll blocks, so it stays off the workers
    let tx = handler.tx.clone();
    tokio::task::spawn_blocking(move || loop {
      if event::poll(tick_rate).unwrap_or(false) {
        if let Ok(CrosstermEvent::Key(key)) = event::read() {
          if key.kind == KeyEventKind::Press && tx.send(Event::Key(key)).is_err() {
            break;
          }
        }
      } else if tx.send(Event::Tick).is_err() {
        break;
      }
    });

    handler
  }

  /// A handler with no terminal reader attached
  fn unattached() -> Self {
    let (tx, rx) = mpsc::unbounded_channel();
    Self { tx, rx }
  }

  /// Forward every change of the connectivity cell as an event
  pub fn watch_connectivity(&self, mut states: watch::Receiver<ConnectivityState>) {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      while states.changed().await.is_ok() {
        let state = *states.borrow_and_update();
        if tx.send(Event::Connectivity(state)).is_err() {
          break;
        }
      }
    });
  }

  /// Receive the next event
  pub async fn next(&mut self) -> Option<Event> {
    self.rx.recv().await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_connectivity_changes_are_forwarded() {
    let (state_tx, state_rx) = watch::channel(ConnectivityState::Online);
    let mut handler = EventHandler::unattached();
    handler.watch_connectivity(state_rx);

    state_tx.send(ConnectivityState::Offline).unwrap();
    assert_eq!(
      handler.next().await,
      Some(Event::Connectivity(ConnectivityState::Offline))
    );
  }
}
