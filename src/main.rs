mod api;
mod app;
mod cache;
mod commands;
mod config;
mod connectivity;
mod error;
mod event;
mod fetch;
mod logging;
mod render;
mod resolve;
mod session;
mod ui;

use clap::{Args as ClapArgs, Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::api::cached_client::CachedCatalogClient;
use crate::api::client::CatalogApi;
use crate::api::query::{Gender, QueryFilters, Status};
use crate::cache::{
  persist_now, spawn_maintenance, CacheNamespace, CacheStore, NoopStorage, SnapshotStorage,
  SqliteStorage,
};
use crate::config::Config;
use crate::connectivity::{ConnectivityMonitor, ConnectivityState};
use crate::fetch::{FetchGate, ReqwestTransport, Transport};
use crate::render::View;
use crate::session::BrowseSession;

/// Reachability probes give up sooner than data requests
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Parser, Debug)]
#[command(name = "rickdex")]
#[command(about = "Browse the Rick and Morty character catalog, online or off")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/rickdex/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Never touch the network; serve from the cache only
  #[arg(long, global = true)]
  offline: bool,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Print one page of characters
  List(ListingArgs),
  /// Print a character and its episodes
  Show {
    /// Character id
    id: u64,
  },
  /// Inspect or manage the local cache
  Cache {
    #[command(subcommand)]
    action: CacheAction,
  },
  /// Interactive browser (default)
  Browse(ListingArgs),
}

#[derive(ClapArgs, Debug, Default)]
struct ListingArgs {
  #[arg(short, long, default_value_t = 1)]
  page: u32,

  /// Filter by name
  #[arg(short, long)]
  name: Option<String>,

  /// alive, dead or unknown
  #[arg(short, long)]
  status: Option<Status>,

  /// female, male, genderless or unknown
  #[arg(short, long)]
  gender: Option<Gender>,
}

impl ListingArgs {
  fn session(&self) -> BrowseSession {
    let filters = QueryFilters {
      name: self.name.clone().unwrap_or_default().trim().to_string(),
      status: self.status,
      gender: self.gender,
    };
    BrowseSession::new(self.page, filters)
  }
}

#[derive(Subcommand, Debug)]
enum CacheAction {
  /// Entry counts per namespace
  Stats,
  /// Remove cached data (listing, detail or episodes; default all)
  Clear { namespace: Option<CacheNamespace> },
  /// Remove expired entries
  Sweep,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = Config::load(args.config.as_deref())?;
  let _log_guard = logging::init(config.log_level.as_deref())?;

  let store = open_store(&config)?;
  let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
  let gate = FetchGate::new(transport.clone()).with_timeout(config.request_timeout());
  let api = CatalogApi::new(gate, &config.api.base_url);

  let connectivity = if args.offline || config.connectivity.force_offline {
    ConnectivityMonitor::forced_offline()
  } else {
    ConnectivityMonitor::new(ConnectivityState::Online)
  };
  let client = CachedCatalogClient::new(api, store.clone(), connectivity.clone());

  let command = args
    .command
    .unwrap_or_else(|| Commands::Browse(ListingArgs::default()));
  let result = match command {
    Commands::List(listing) => {
      connectivity
        .probe_once(transport.as_ref(), &config.api.base_url, PROBE_TIMEOUT)
        .await;
      run_list(&client, listing.session()).await
    }
    Commands::Show { id } => {
      connectivity
        .probe_once(transport.as_ref(), &config.api.base_url, PROBE_TIMEOUT)
        .await;
      run_show(&client, id).await
    }
    Commands::Cache { action } => run_cache(&store, action),
    Commands::Browse(listing) => {
      let probe = connectivity.spawn_probe(
        transport.clone(),
        config.api.base_url.clone(),
        Duration::from_secs(config.connectivity.probe_interval_secs.max(1)),
        PROBE_TIMEOUT,
      );
      let maintenance = spawn_maintenance(store.clone(), config.cache.intervals());

      let mut app = app::App::new(client, listing.session());
      let result = app.run().await;

      probe.abort();
      maintenance.abort();
      result
    }
  };

  // Final save so nothing fetched in this run is lost
  persist_now(&store).await;
  result
}

fn open_store(config: &Config) -> Result<CacheStore> {
  let storage: Arc<dyn SnapshotStorage> = if config.cache.persist {
    Arc::new(SqliteStorage::open(
      config.cache.path.as_deref(),
      config.cache.max_storage_bytes(),
    )?)
  } else {
    Arc::new(NoopStorage)
  };

  let store = CacheStore::new(storage).with_expiration(config.cache.expiration());
  let restored = store.restore();
  info!(restored, stats = ?store.stats(), "Cache ready");
  Ok(store)
}

async fn run_list(client: &CachedCatalogClient, mut session: BrowseSession) -> Result<()> {
  match client.characters(session.page(), session.filters()).await {
    Ok(result) => {
      session.update_from(&result.data.info, result.is_cached());
      println!("{}", render::listing(&result, &session).trim_end());
      Ok(())
    }
    Err(e) => Err(eyre!("{}", render::error_message(&e, View::Listing))),
  }
}

async fn run_show(client: &CachedCatalogClient, id: u64) -> Result<()> {
  match client.character_with_episodes(id).await {
    Ok(detail) => {
      println!("{}", render::detail(&detail).trim_end());
      Ok(())
    }
    Err(e) => Err(eyre!("{}", render::error_message(&e, View::Detail))),
  }
}

fn run_cache(store: &CacheStore, action: CacheAction) -> Result<()> {
  match action {
    CacheAction::Stats => {
      println!("{}", render::stats(&store.stats()));
    }
    CacheAction::Clear { namespace } => {
      store.clear(namespace);
      match namespace {
        Some(ns) => println!("Cleared {} cache", ns.label()),
        None => println!("Cleared all cached data"),
      }
    }
    CacheAction::Sweep => {
      let removed = store.sweep();
      println!("Removed {} expired entries", removed);
    }
  }
  Ok(())
}
