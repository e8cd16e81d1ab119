//! Dataset ETags for optimistic locking.
//!
//! The tag is a SHA-256 over both tables exactly as they would be persisted,
//! so any change that would reach the file changes the tag.

use axum::http::{HeaderMap, header};
use sha2::{Digest, Sha256};
use upkeep_core::{
  cell::Cell,
  dataset::{Dataset, Table},
};

use crate::error::Error;

/// Compute a quoted strong ETag for `dataset`.
pub fn compute_etag(dataset: &Dataset) -> String {
  let mut hasher = Sha256::new();
  hash_table(&mut hasher, &dataset.main_table());
  hash_table(&mut hasher, &dataset.history_table());
  format!("\"{}\"", hex::encode(hasher.finalize()))
}

fn hash_table(hasher: &mut Sha256, table: &Table) {
  hash_str(hasher, &table.name);
  hasher.update((table.columns.len() as u64).to_le_bytes());
  for column in &table.columns {
    hash_str(hasher, column);
  }
  hasher.update((table.rows.len() as u64).to_le_bytes());
  for row in &table.rows {
    hasher.update((row.len() as u64).to_le_bytes());
    for cell in row {
      hash_cell(hasher, cell);
    }
  }
}

fn hash_str(hasher: &mut Sha256, s: &str) {
  hasher.update((s.len() as u64).to_le_bytes());
  hasher.update(s.as_bytes());
}

fn hash_cell(hasher: &mut Sha256, cell: &Cell) {
  match cell {
    Cell::Empty => hasher.update([0u8]),
    Cell::Integer(n) => {
      hasher.update([1u8]);
      hasher.update(n.to_le_bytes());
    }
    Cell::Real(f) => {
      hasher.update([2u8]);
      hasher.update(f.to_bits().to_le_bytes());
    }
    Cell::Text(s) => {
      hasher.update([3u8]);
      hash_str(hasher, s);
    }
  }
}

pub fn strip_etag_quotes(s: &str) -> &str {
  let s = s.trim();
  let s = s.strip_prefix("W/").unwrap_or(s);
  s.strip_prefix('"')
    .and_then(|s| s.strip_suffix('"'))
    .unwrap_or(s)
}

/// Check an `If-Match` header against the current tag. An absent header
/// always passes; `*` matches any existing dataset.
pub fn check_if_match(headers: &HeaderMap, current: &str) -> Result<(), Error> {
  let Some(value) = headers.get(header::IF_MATCH) else {
    return Ok(());
  };
  let value = value.to_str().map_err(|_| Error::PreconditionFailed)?;
  let current = strip_etag_quotes(current);
  let matched = value
    .split(',')
    .map(strip_etag_quotes)
    .any(|tag| tag == "*" || tag == current);
  if matched { Ok(()) } else { Err(Error::PreconditionFailed) }
}
