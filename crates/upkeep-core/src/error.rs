//! Error types for `upkeep-core`.

use thiserror::Error;

use crate::columns::Field;

#[derive(Debug, Error)]
pub enum Error {
  /// One or more required columns could not be matched against the main
  /// table's headers. Callers must not proceed with a partial dataset.
  #[error("schema error: missing required columns: {}", join_fields(.0))]
  Schema(Vec<Field>),

  #[error("equipment not found: {0}")]
  NotFound(String),

  #[error("interval must be at least 1 day, got {0}")]
  InvalidInterval(i64),

  #[error("{field} cannot be set on {category:?} equipment")]
  NotApplicable {
    field:    Field,
    category: String,
  },

  #[error("table {table:?} has no {field} column")]
  MissingColumn {
    table: String,
    field: Field,
  },
}

fn join_fields(fields: &[Field]) -> String {
  fields
    .iter()
    .map(|f| f.to_string())
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
