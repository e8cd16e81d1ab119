//! Service history, the append-only log of servicing events.
//!
//! Entries are never updated or deleted once written. The history table has a
//! fixed name ([`HISTORY_TABLE`]) and the headers in [`HISTORY_COLUMNS`]; a
//! table written by another tool may order them differently, lack some, or
//! carry columns of its own. All of that is kept as found.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::cell::{
  Cell, Parsed, encode_date, encode_interval, encode_timestamp, parse_date,
  parse_interval, parse_timestamp, write_back,
};

/// Name of the history table in the backing store.
pub const HISTORY_TABLE: &str = "Service History";

/// Column headers of the history table, in order.
pub const HISTORY_COLUMNS: [&str; 5] =
  ["Tag", "Serviced Date", "Interval (days)", "Service Type", "Logged At"];

// ─── ServiceType ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
  Planned,
  Breakdown,
  Routine,
  /// A label written by some other tool; preserved as-is.
  Other(String),
}

impl ServiceType {
  pub fn parse(s: &str) -> Self {
    match s {
      "Planned" => Self::Planned,
      "Breakdown" => Self::Breakdown,
      "Routine" => Self::Routine,
      other => Self::Other(other.to_owned()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Planned => "Planned",
      Self::Breakdown => "Breakdown",
      Self::Routine => "Routine",
      Self::Other(s) => s,
    }
  }
}

impl fmt::Display for ServiceType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── ServiceHistoryEntry ─────────────────────────────────────────────────────

// ─── HistoryLayout ───────────────────────────────────────────────────────────

const TAG: usize = 0;
const SERVICED_DATE: usize = 1;
const INTERVAL_DAYS: usize = 2;
const SERVICE_TYPE: usize = 3;
const LOGGED_AT: usize = 4;

/// The history table's headers and where each [`HISTORY_COLUMNS`] field sits
/// among them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryLayout {
  pub columns:   Vec<String>,
  /// Column index of each field, in [`HISTORY_COLUMNS`] order.
  pub positions: [usize; 5],
}

impl Default for HistoryLayout {
  fn default() -> Self {
    Self {
      columns:   HISTORY_COLUMNS.map(String::from).to_vec(),
      positions: [TAG, SERVICED_DATE, INTERVAL_DAYS, SERVICE_TYPE, LOGGED_AT],
    }
  }
}

impl HistoryLayout {
  /// Locate each field in `headers` (trimmed, case-insensitive). Without a
  /// `Tag` column, a column named like the main table's tag column
  /// (`main_tag_header`) holds the tag. Fields still missing get a new column
  /// appended after the existing ones.
  pub fn resolve(headers: Vec<String>, main_tag_header: &str) -> Self {
    let find = |name: &str| {
      let name = name.trim();
      headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let found: [Option<usize>; 5] = [
      find(HISTORY_COLUMNS[TAG]).or_else(|| find(main_tag_header)),
      find(HISTORY_COLUMNS[SERVICED_DATE]),
      find(HISTORY_COLUMNS[INTERVAL_DAYS]),
      find(HISTORY_COLUMNS[SERVICE_TYPE]),
      find(HISTORY_COLUMNS[LOGGED_AT]),
    ];

    let mut columns = headers;
    let mut positions = [0; 5];
    for (k, slot) in found.into_iter().enumerate() {
      positions[k] = slot.unwrap_or_else(|| {
        columns.push(HISTORY_COLUMNS[k].to_owned());
        columns.len() - 1
      });
    }
    Self { columns, positions }
  }
}

// ─── ServiceHistoryEntry ─────────────────────────────────────────────────────

/// One servicing event. `tag` refers to an [`crate::equipment::EquipmentRecord`]
/// by value; the reference is not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceHistoryEntry {
  pub tag:           String,
  pub serviced_date: Parsed<NaiveDate>,
  pub interval_days: Parsed<i64>,
  pub service_type:  ServiceType,
  /// Set when the entry is appended; never changes afterwards.
  pub logged_at:     Parsed<NaiveDateTime>,
  /// The row as stored, including columns the tracker does not read.
  #[serde(skip)]
  pub source:        Vec<Cell>,
}

impl ServiceHistoryEntry {
  /// Interpret a history row. Cells past the end of a short row read as empty.
  pub fn from_row(layout: &HistoryLayout, row: &[Cell]) -> Self {
    let empty = Cell::Empty;
    let at = |k: usize| row.get(layout.positions[k]).unwrap_or(&empty);

    Self {
      tag:           at(TAG).to_text(),
      serviced_date: parse_date(at(SERVICED_DATE)),
      interval_days: parse_interval(at(INTERVAL_DAYS)),
      service_type:  ServiceType::parse(&at(SERVICE_TYPE).to_text()),
      logged_at:     parse_timestamp(at(LOGGED_AT)),
      source:        row.to_vec(),
    }
  }

  /// The row under `layout`. Stored cells are written back as they were;
  /// only a field that no longer matches its cell is encoded afresh.
  pub fn to_row(&self, layout: &HistoryLayout) -> Vec<Cell> {
    let empty = Cell::Empty;
    let text = |c: &Cell| c.to_text();
    (0..layout.columns.len())
      .map(|i| {
        let raw = self.source.get(i).unwrap_or(&empty);
        match layout.positions.iter().position(|p| *p == i) {
          Some(TAG) => write_back(raw, text, &self.tag, || Cell::text(&self.tag)),
          Some(SERVICED_DATE) => {
            write_back(raw, parse_date, &self.serviced_date, || encode_date(&self.serviced_date))
          }
          Some(INTERVAL_DAYS) => write_back(raw, parse_interval, &self.interval_days, || {
            encode_interval(&self.interval_days)
          }),
          Some(SERVICE_TYPE) => write_back(
            raw,
            |c| ServiceType::parse(&c.to_text()),
            &self.service_type,
            || Cell::text(self.service_type.as_str()),
          ),
          Some(LOGGED_AT) => {
            write_back(raw, parse_timestamp, &self.logged_at, || encode_timestamp(&self.logged_at))
          }
          _ => raw.clone(),
        }
      })
      .collect()
  }
}

// ─── NewHistoryEntry ─────────────────────────────────────────────────────────

/// Input to [`crate::dataset::Dataset::append_history`].
/// `logged_at` is always set at append time; it is not accepted from callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHistoryEntry {
  pub tag:           String,
  pub serviced_date: NaiveDate,
  pub interval_days: i64,
  pub service_type:  ServiceType,
}
