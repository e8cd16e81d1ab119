//! JSON HTTP service for the equipment maintenance tracker.
//!
//! Exposes an axum [`Router`] backed by any [`RecordStore`]. Every route
//! requires HTTP Basic auth; only Supervisors may log services.

pub mod auth;
pub mod error;
pub mod etag;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use upkeep_core::{
  access::{CredentialVerifier, Role},
  store::RecordStore,
};

use handlers::{equipment, service, session, summary};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  /// Equipment table name; when unset the first non-history table is used.
  #[serde(default)]
  pub main_table: Option<String>,
  #[serde(default)]
  pub accounts:   Vec<AccountConfig>,
}

/// One sign-in account.
#[derive(Deserialize, Clone)]
pub struct AccountConfig {
  pub username:      String,
  pub role:          Role,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: RecordStore> {
  pub store:       Arc<S>,
  pub credentials: Arc<dyn CredentialVerifier>,
  /// Serialises load-mutate-persist cycles within this process.
  pub writes:      Arc<Mutex<()>>,
}

impl<S: RecordStore> AppState<S> {
  pub fn new(store: S, credentials: Arc<dyn CredentialVerifier>) -> Self {
    Self {
      store: Arc::new(store),
      credentials,
      writes: Arc::new(Mutex::new(())),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router, mounted under `/api`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + Clone + 'static,
{
  let api = Router::new()
    .route("/session", get(session::handler))
    .route("/equipment", get(equipment::list::<S>))
    .route("/equipment/{tag}", get(equipment::get_one::<S>))
    .route("/equipment/{tag}/service", post(service::handler::<S>))
    .route("/summary", get(summary::handler::<S>));

  Router::new()
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
