//! Background upkeep for the cache store: periodic persist and sweep, plus
//! persist-on-write.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use super::store::{CacheStore, PersistOutcome};

/// Timer settings for [`spawn_maintenance`].
#[derive(Debug, Clone, Copy)]
pub struct MaintenanceIntervals {
  pub persist: Duration,
  pub sweep: Duration,
}

impl Default for MaintenanceIntervals {
  fn default() -> Self {
    Self {
      persist: Duration::from_secs(60),
      sweep: Duration::from_secs(300),
    }
  }
}

/// Spawn the maintenance loop. Abort the handle to stop it.
pub fn spawn_maintenance(store: CacheStore, intervals: MaintenanceIntervals) -> JoinHandle<()> {
  tokio::spawn(async move {
    let signal = store.persist_signal();

    let mut persist_tick = tokio::time::interval(intervals.persist);
    persist_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut sweep_tick = tokio::time::interval(intervals.sweep);
    sweep_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // Intervals fire immediately; skip that first tick
    persist_tick.tick().await;
    sweep_tick.tick().await;

    loop {
      tokio::select! {
        _ = signal.notified() => {
          persist_now(&store).await;
        }
        _ = persist_tick.tick() => {
          persist_now(&store).await;
        }
        _ = sweep_tick.tick() => {
          let removed = store.sweep();
          debug!(removed, "Sweep finished");
        }
      }
    }
  })
}

/// Persist on the blocking pool so SQLite I/O stays off the async workers.
pub async fn persist_now(store: &CacheStore) -> Option<PersistOutcome> {
  let store = store.clone();
  match tokio::task::spawn_blocking(move || store.persist()).await {
    Ok(Ok(outcome)) => {
      debug!(?outcome, "Cache persisted");
      Some(outcome)
    }
    Ok(Err(e)) => {
      error!(error = %e, "Error saving cache");
      None
    }
    Err(e) => {
      error!(error = %e, "Persist task failed");
      None
    }
  }
}
