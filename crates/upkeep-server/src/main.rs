//! upkeep-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! tracker file, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```
//! cargo run -p upkeep-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use upkeep_core::{access::Role, store::RecordStore};
use upkeep_server::{AppState, ServerConfig, auth::CredentialTable};
use upkeep_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Equipment maintenance tracker server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "~/.local/share/upkeep/tracker.db")?
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("UPKEEP"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let credentials = CredentialTable::new(server_cfg.accounts.clone())
    .map_err(|e| anyhow::anyhow!("invalid password_hash in accounts: {e}"))?;
  if credentials.is_empty() {
    tracing::warn!("no accounts configured; every request will be rejected");
  } else if !server_cfg.accounts.iter().any(|a| a.role == Role::Supervisor) {
    tracing::warn!("no Supervisor account configured; the tracker is read-only");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let mut store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  if let Some(table) = &server_cfg.main_table {
    store = store.with_main_table(table.clone());
  }

  // Refuse to serve a file whose equipment table cannot be read.
  let dataset = store
    .load()
    .await
    .with_context(|| format!("failed to load equipment from {store_path:?}"))?;
  tracing::info!(
    table = %dataset.layout.name,
    records = dataset.records.len(),
    history = dataset.history.len(),
    accounts = credentials.len(),
    "tracker loaded"
  );

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let state = AppState::new(store, Arc::new(credentials));
  let app = upkeep_server::router(state);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from one line of stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
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
