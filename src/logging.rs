use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

/// Log directory: $XDG_DATA_HOME/rickdex/logs
pub fn log_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
  Ok(data_dir.join("rickdex").join("logs"))
}

/// RUST_LOG wins over the configured level.
fn filter(level: Option<&str>) -> Result<EnvFilter> {
  match EnvFilter::try_from_default_env() {
    Ok(filter) => Ok(filter),
    Err(_) => {
      let level = level.unwrap_or(DEFAULT_LEVEL);
      EnvFilter::try_new(level).map_err(|e| eyre!("Invalid log level '{}': {}", level, e))
    }
  }
}

/// Install the global subscriber writing to a daily rolling file, so the
/// terminal only shows program output. Keep the guard alive until exit.
pub fn init(level: Option<&str>) -> Result<WorkerGuard> {
  init_in(&log_dir()?, level)
}

fn init_in(dir: &Path, level: Option<&str>) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(dir, "rickdex.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  tracing_subscriber::registry()
    .with(filter(level)?)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
