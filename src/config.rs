use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::cache::MaintenanceIntervals;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub connectivity: ConnectivityConfig,
  /// Log filter used when RUST_LOG is not set (e.g. "info", "rickdex=debug")
  pub log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  /// Per-request timeout, also the shared deadline for episode batches
  pub timeout_secs: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://rickandmortyapi.com/api".to_string(),
      timeout_secs: 10,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a cached entry stays valid
  pub expiration_mins: i64,
  pub sweep_interval_secs: u64,
  pub persist_interval_secs: u64,
  /// Keep the cache across runs. When false nothing is read or written.
  pub persist: bool,
  /// Cache database location (default: $XDG_DATA_HOME/rickdex/cache.db)
  pub path: Option<PathBuf>,
  /// Size cap for the cache database in KiB
  pub max_storage_kb: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      expiration_mins: 60,
      sweep_interval_secs: 300,
      persist_interval_secs: 60,
      persist: true,
      path: None,
      max_storage_kb: None,
    }
  }
}

impl CacheConfig {
  /// Bounded by `Config::validated`; out-of-range values fall back to zero.
  pub fn expiration(&self) -> chrono::Duration {
    chrono::Duration::try_minutes(self.expiration_mins.max(0))
      .unwrap_or_else(chrono::Duration::zero)
  }

  pub fn intervals(&self) -> MaintenanceIntervals {
    MaintenanceIntervals {
      persist: Duration::from_secs(self.persist_interval_secs.max(1)),
      sweep: Duration::from_secs(self.sweep_interval_secs.max(1)),
    }
  }

  pub fn max_storage_bytes(&self) -> Option<u64> {
    self.max_storage_kb.and_then(|kb| kb.checked_mul(1024))
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectivityConfig {
  pub probe_interval_secs: u64,
  /// Never touch the network
  pub force_offline: bool,
}

impl Default for ConnectivityConfig {
  fn default() -> Self {
    Self {
      probe_interval_secs: 30,
      force_offline: false,
    }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./rickdex.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/rickdex/config.yaml
  ///
  /// Without a file every setting takes its default. RICKDEX_API_URL
  /// overrides the API base URL.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    config
      .with_api_url_override(std::env::var("RICKDEX_API_URL").ok())
      .validated()
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("rickdex.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("rickdex").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self> {
    // An empty file is a valid, all-defaults config
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    serde_yaml::from_str(contents).map_err(|e| eyre!("{}", e))
  }

  fn with_api_url_override(mut self, url: Option<String>) -> Self {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
      self.api.base_url = url;
    }
    self
  }

  fn validated(self) -> Result<Self> {
    Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid API base URL '{}': {}", self.api.base_url, e))?;
    if self.api.timeout_secs == 0 {
      return Err(eyre!("api.timeout_secs must be greater than zero"));
    }
    if chrono::Duration::try_minutes(self.cache.expiration_mins).is_none() {
      return Err(eyre!("cache.expiration_mins out of range"));
    }
    if let Some(kb) = self.cache.max_storage_kb {
      if kb.checked_mul(1024).is_none() {
        return Err(eyre!("cache.max_storage_kb out of range"));
      }
    }
    Ok(self)
  }

  pub fn request_timeout(&self) -> Duration {
    Duration::from_secs(self.api.timeout_secs)
  }
}
