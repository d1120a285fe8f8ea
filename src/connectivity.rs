//! Connectivity monitor: an observable online/offline cell.
//!
//! Resolvers read the current state synchronously before deciding whether to
//! touch the network. The state is only changed here, either by the probe
//! task or by forcing offline mode.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::fetch::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
  Online,
  Offline,
}

impl ConnectivityState {
  pub fn is_online(self) -> bool {
    self == ConnectivityState::Online
  }
}

#[derive(Clone)]
pub struct ConnectivityMonitor {
  tx: Arc<watch::Sender<ConnectivityState>>,
  forced_offline: bool,
}

impl ConnectivityMonitor {
  /// Start in the given state. Probing will correct an optimistic guess.
  pub fn new(initial: ConnectivityState) -> Self {
    let (tx, _) = watch::channel(initial);
    Self {
      tx: Arc::new(tx),
      forced_offline: false,
    }
  }

  /// A monitor pinned to offline; later signals are ignored.
  pub fn forced_offline() -> Self {
    let mut monitor = Self::new(ConnectivityState::Offline);
    monitor.forced_offline = true;
    monitor
  }

  pub fn is_forced_offline(&self) -> bool {
    self.forced_offline
  }

  pub fn state(&self) -> ConnectivityState {
    *self.tx.borrow()
  }

  pub fn is_online(&self) -> bool {
    self.state().is_online()
  }

  /// Record an environment signal. Returns true when the state changed.
  pub fn set_state(&self, state: ConnectivityState) -> bool {
    if self.forced_offline {
      return false;
    }

    let changed = self.tx.send_if_modified(|current| {
      if *current == state {
        false
      } else {
        *current = state;
        true
      }
    });

    if changed {
      match state {
        ConnectivityState::Online => info!("Connection restored"),
        ConnectivityState::Offline => info!("Connection lost"),
      }
    }
    changed
  }

  /// Watch transitions.
  pub fn subscribe(&self) -> watch::Receiver<ConnectivityState> {
    self.tx.subscribe()
  }

  /// Check reachability once and record the result.
  ///
  /// Any HTTP response counts as online; only transport failure or timeout
  /// means offline.
  pub async fn probe_once(
    &self,
    transport: &dyn Transport,
    url: &str,
    timeout: Duration,
  ) -> ConnectivityState {
    if self.forced_offline {
      return ConnectivityState::Offline;
    }

    let state = match tokio::time::timeout(timeout, transport.get(url)).await {
      Ok(Ok(_)) => ConnectivityState::Online,
      _ => ConnectivityState::Offline,
    };
    self.set_state(state);
    state
  }

  /// Probe `url` every `interval` until the handle is aborted.
  pub fn spawn_probe(
    &self,
    transport: Arc<dyn Transport>,
    url: String,
    interval: Duration,
    timeout: Duration,
  ) -> JoinHandle<()> {
    let monitor = self.clone();
    tokio::spawn(async move {
      loop {
        monitor.probe_once(transport.as_ref(), &url, timeout).await;
        tokio::time::sleep(interval).await;
      }
    })
  }
}
