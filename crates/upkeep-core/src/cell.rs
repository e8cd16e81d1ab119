//! Raw table cells and their typed interpretations.
//!
//! A backing store hands the core a grid of [`Cell`]s. Fields the tracker
//! understands are interpreted into [`Parsed`] values; a cell that cannot be
//! read is kept verbatim so that rewriting the table never destroys it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ─── Cell ────────────────────────────────────────────────────────────────────

/// A single value as stored in a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
  #[default]
  Empty,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Cell {
  /// The cell's contents as display text; `Empty` renders as `""`.
  pub fn to_text(&self) -> String {
    match self {
      Self::Empty => String::new(),
      Self::Integer(n) => n.to_string(),
      Self::Real(f) => f.to_string(),
      Self::Text(s) => s.clone(),
    }
  }

  /// A text cell, or `Empty` for the empty string.
  pub fn text(s: impl Into<String>) -> Self {
    let s = s.into();
    if s.is_empty() { Self::Empty } else { Self::Text(s) }
  }
}

/// The cell to store for a field: `raw` itself while it still reads back as
/// `current`, otherwise a fresh encoding. Untouched cells keep their exact
/// storage form.
pub fn write_back<T: PartialEq>(
  raw: &Cell,
  read: impl FnOnce(&Cell) -> T,
  current: &T,
  encode: impl FnOnce() -> Cell,
) -> Cell {
  if read(raw) == *current { raw.clone() } else { encode() }
}

// ─── Parsed ──────────────────────────────────────────────────────────────────

/// An interpreted cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Parsed<T> {
  /// Nothing recorded.
  Empty,
  Valid(T),
  /// Something is recorded but it could not be read; kept for write-back.
  Invalid(Cell),
}

impl<T> Parsed<T> {
  pub fn valid(&self) -> Option<&T> {
    match self {
      Self::Valid(v) => Some(v),
      _ => None,
    }
  }
}

impl<T: Copy> Parsed<T> {
  pub fn get(&self) -> Option<T> { self.valid().copied() }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%d %H:%M:%S%.f",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%d %H:%M",
  "%Y-%m-%dT%H:%M",
];

/// Format used when writing timestamps back to a table.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format used when writing dates back to a table.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_datetime_text(s: &str) -> Option<NaiveDateTime> {
  DATETIME_FORMATS
    .iter()
    .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
    .or_else(|| {
      DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(s, f).ok())
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
    })
}

/// Read a calendar date. A time-of-day component, if present, is dropped.
pub fn parse_date(cell: &Cell) -> Parsed<NaiveDate> {
  parse_timestamp(cell).map_valid(|dt| dt.date())
}

/// Read a timestamp. A bare date reads as midnight.
pub fn parse_timestamp(cell: &Cell) -> Parsed<NaiveDateTime> {
  match cell {
    Cell::Empty => Parsed::Empty,
    Cell::Text(s) if s.trim().is_empty() => Parsed::Empty,
    Cell::Text(s) => match parse_datetime_text(s.trim()) {
      Some(dt) => Parsed::Valid(dt),
      None => Parsed::Invalid(cell.clone()),
    },
    other => Parsed::Invalid(other.clone()),
  }
}

pub fn encode_date(value: &Parsed<NaiveDate>) -> Cell {
  match value {
    Parsed::Empty => Cell::Empty,
    Parsed::Valid(d) => Cell::Text(d.format(DATE_FORMAT).to_string()),
    Parsed::Invalid(raw) => raw.clone(),
  }
}

pub fn encode_timestamp(value: &Parsed<NaiveDateTime>) -> Cell {
  match value {
    Parsed::Empty => Cell::Empty,
    Parsed::Valid(dt) => Cell::Text(dt.format(DATETIME_FORMAT).to_string()),
    Parsed::Invalid(raw) => raw.clone(),
  }
}

// ─── Intervals ───────────────────────────────────────────────────────────────

fn whole_days(f: f64) -> Option<i64> {
  (f.is_finite() && f >= 1.0 && f < i64::MAX as f64).then(|| f.trunc() as i64)
}

/// Read a service interval in days. Values below one day are invalid.
/// Fractional values are truncated.
pub fn parse_interval(cell: &Cell) -> Parsed<i64> {
  let days = match cell {
    Cell::Empty => return Parsed::Empty,
    Cell::Text(s) if s.trim().is_empty() => return Parsed::Empty,
    Cell::Integer(n) => Some(*n).filter(|n| *n >= 1),
    Cell::Real(f) => whole_days(*f),
    Cell::Text(s) => {
      let s = s.trim();
      s.parse::<i64>()
        .ok()
        .filter(|n| *n >= 1)
        .or_else(|| s.parse::<f64>().ok().and_then(whole_days))
    }
  };
  match days {
    Some(n) => Parsed::Valid(n),
    None => Parsed::Invalid(cell.clone()),
  }
}

pub fn encode_interval(value: &Parsed<i64>) -> Cell {
  match value {
    Parsed::Empty => Cell::Empty,
    Parsed::Valid(n) => Cell::Integer(*n),
    Parsed::Invalid(raw) => raw.clone(),
  }
}

impl<T> Parsed<T> {
  fn map_valid<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
    match self {
      Self::Empty => Parsed::Empty,
      Self::Valid(v) => Parsed::Valid(f(v)),
      Self::Invalid(raw) => Parsed::Invalid(raw),
    }
  }
}
