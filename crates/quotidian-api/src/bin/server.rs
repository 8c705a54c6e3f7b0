//! quotidian server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, optionally seeds the corpus from a JSON file,
//! and serves the quote API over HTTP.
//!
//! # Seeding
//!
//! The corpus load is a one-time, idempotent bulk insert keyed by quote id:
//!
//! ```text
//! cargo run -p quotidian-api --bin server -- --seed quotes.json
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use quotidian_api::{AppState, ServerConfig};
use quotidian_core::{engine::SelectionEngine, quote::Quote, store::QuoteStore as _};
use quotidian_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Quotidian daily-quote server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// JSON corpus file (array of quotes) to bulk-insert before serving.
  /// Quotes whose id already exists are skipped.
  #[arg(long)]
  seed: Option<PathBuf>,
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
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080_i64)?
    .set_default("store_path", "quotidian.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("QUOTIDIAN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Optional one-time corpus seed.
  if let Some(seed_path) = &cli.seed {
    let file = std::fs::File::open(seed_path)
      .with_context(|| format!("failed to open seed file {seed_path:?}"))?;
    let quotes: Vec<Quote> = serde_json::from_reader(std::io::BufReader::new(file))
      .context("failed to parse seed file")?;
    let total = quotes.len();
    let inserted = store.seed_quotes(quotes).await?;
    tracing::info!(inserted, skipped = total - inserted, "corpus seeded");
  }

  // Build application state.
  let store = Arc::new(store);
  let state = AppState {
    engine: Arc::new(SelectionEngine::new(store.clone())),
    store,
  };

  let app = quotidian_api::router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
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
