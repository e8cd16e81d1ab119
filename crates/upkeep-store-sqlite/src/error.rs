//! Error type for `upkeep-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] upkeep_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// The configured main table does not exist in the database.
  #[error("table not found: {0:?}")]
  TableNotFound(String),

  /// No main table was configured and the database has no candidate.
  #[error("database has no equipment table")]
  NoEquipmentTable,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
