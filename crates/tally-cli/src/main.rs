//! `tally` binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! local SQLite event store, and drives the collector façade from the
//! command line. This is the in-repo composition root: a host process would
//! wire the same pieces together behind its own call transport.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;
use tally_core::{
  capacity::Capacity,
  event::{EventBundle, EventKind},
  store::EventStore as _,
};
use tally_service::{AlwaysReady, BootMarker, Collector, Readiness};
use tally_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Tally event collection service")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Record a single package name under an event kind.
  Collect {
    #[arg(long, value_enum)]
    kind:    KindArg,
    #[arg(long)]
    package: String,
  },
  /// Deliver a generic data event by wire code, with an optional
  /// accessibility service list.
  Notify {
    /// Integer event-kind code, as sent across the call boundary.
    #[arg(long)]
    code:     i64,
    /// Enabled accessibility service; repeat for each entry, in order.
    #[arg(long = "service")]
    services: Vec<String>,
    /// Send an explicitly empty service list ("everything disabled").
    #[arg(long, conflicts_with = "services")]
    empty:    bool,
    /// Raw JSON bundle; overrides --service/--empty.
    #[arg(long, conflicts_with_all = ["services", "empty"])]
    bundle:   Option<String>,
  },
  /// Log every stored row in insertion order.
  Dump,
  /// Delete all stored rows. Development/testing only; the schema and its
  /// version survive.
  Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
  DeviceAdmin,
  Accessibility,
  UsageStats,
}

impl From<KindArg> for EventKind {
  fn from(kind: KindArg) -> Self {
    match kind {
      KindArg::DeviceAdmin => Self::DeviceAdmin,
      KindArg::Accessibility => Self::Accessibility,
      KindArg::UsageStats => Self::UsageStats,
    }
  }
}

/// Runtime configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
struct ServiceConfig {
  store_path:  PathBuf,
  /// Row ceiling for the event table; absent means unbounded.
  capacity:    Option<u64>,
  /// Marker file whose existence signals host boot completion; absent
  /// means always ready.
  boot_marker: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read config file")?;

  let service_cfg: ServiceConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServiceConfig")?;

  let store_path = expand_tilde(&service_cfg.store_path);
  let capacity = service_cfg
    .capacity
    .map_or(Capacity::Unbounded, Capacity::Bounded);

  let readiness: Box<dyn Readiness> = match &service_cfg.boot_marker {
    Some(marker) => Box::new(BootMarker::new(expand_tilde(marker))),
    None => Box::new(AlwaysReady),
  };

  // A failed open degrades ingestion commands to logged no-ops rather than
  // crashing, matching the service's contract towards its host.
  let store = match SqliteStore::open(&store_path, capacity).await {
    Ok(store) => Some(store),
    Err(e) => {
      tracing::error!(error = %e, path = %store_path.display(), "failed to open event store");
      None
    }
  };

  match cli.command {
    Command::Collect { kind, package } => {
      let collector = build_collector(store, readiness);
      collector.collect(kind.into(), &package).await;
    }
    Command::Notify { code, services, empty, bundle } => {
      let bundle = match bundle {
        Some(raw) => {
          EventBundle::from_json(&raw).context("failed to parse --bundle")?
        }
        None if empty => {
          EventBundle { enabled_service_list: Some(Vec::new()) }
        }
        None if !services.is_empty() => {
          EventBundle { enabled_service_list: Some(services) }
        }
        None => EventBundle::default(),
      };
      let collector = build_collector(store, readiness);
      collector.notify_event(code, bundle).await;
    }
    Command::Dump => {
      let collector = build_collector(store, readiness);
      collector.dump().await;
    }
    Command::Reset => {
      // Reset bypasses the façade on purpose; it is not an ingestion call
      // and must stay unreachable from that path.
      let store = store.context("cannot reset: event store failed to open")?;
      store.reset().await.context("reset failed")?;
      tracing::info!("event table cleared");
    }
  }

  Ok(())
}

fn build_collector(
  store: Option<SqliteStore>,
  readiness: Box<dyn Readiness>,
) -> Collector<SqliteStore, Box<dyn Readiness>> {
  match store {
    Some(store) => Collector::new(store, readiness),
    None => Collector::failed(readiness),
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
