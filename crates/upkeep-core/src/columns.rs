//! Column identification for the main equipment table.
//!
//! Spreadsheets in the field name their columns inconsistently ("Area",
//! "Location", "Department"…). Each [`Field`] has a small set of accepted
//! header synonyms, compared case-insensitively after trimming whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A column the tracker interprets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  Area,
  Category,
  Tag,
  Function,
  ServicedDate,
  IntervalDays,
  KitPartNumber,
  SerialNumber,
}

impl Field {
  /// Fields without which the table cannot be loaded, in resolution order.
  pub const REQUIRED: [Field; 6] = [
    Field::Area,
    Field::Category,
    Field::Tag,
    Field::Function,
    Field::ServicedDate,
    Field::IntervalDays,
  ];

  pub const OPTIONAL: [Field; 2] = [Field::KitPartNumber, Field::SerialNumber];

  /// Accepted header spellings.
  pub fn synonyms(self) -> &'static [&'static str] {
    match self {
      Self::Area => &["Area", "Location", "Department"],
      Self::Category => &["Category", "Type", "Equipment Type"],
      Self::Tag => &["Valve Tag number", "Tag", "Tag Number"],
      Self::Function => &["Function", "Function Description"],
      Self::ServicedDate => &["Serviced Date", "Last Serviced"],
      Self::IntervalDays => &["Interval (days)", "Service Interval", "Interval"],
      Self::KitPartNumber => &["Service Kit Part Number", "Kit Number", "Part Number"],
      Self::SerialNumber => &["Serial Number", "SN"],
    }
  }

  /// Whether `header` names this field.
  pub fn matches(self, header: &str) -> bool {
    let header = header.trim();
    self
      .synonyms()
      .iter()
      .any(|s| s.eq_ignore_ascii_case(header))
  }
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    // The first synonym doubles as the canonical display name.
    f.write_str(self.synonyms()[0])
  }
}

// ─── ColumnMap ───────────────────────────────────────────────────────────────

/// Positions of the interpreted fields within a table's header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
  pub area:            usize,
  pub category:        usize,
  pub tag:             usize,
  pub function:        usize,
  pub serviced_date:   usize,
  pub interval_days:   usize,
  pub kit_part_number: Option<usize>,
  pub serial_number:   Option<usize>,
}

fn find(headers: &[String], field: Field) -> Option<usize> {
  headers.iter().position(|h| field.matches(h))
}

impl ColumnMap {
  /// Resolve every field against `headers`; the first matching header wins.
  ///
  /// Fails with [`Error::Schema`] listing every required field that has no
  /// matching header.
  pub fn resolve(headers: &[String]) -> Result<Self> {
    let missing: Vec<Field> = Field::REQUIRED
      .into_iter()
      .filter(|f| find(headers, *f).is_none())
      .collect();
    if !missing.is_empty() {
      return Err(Error::Schema(missing));
    }

    let required = |f| find(headers, f).ok_or(Error::Schema(vec![f]));
    Ok(Self {
      area:            required(Field::Area)?,
      category:        required(Field::Category)?,
      tag:             required(Field::Tag)?,
      function:        required(Field::Function)?,
      serviced_date:   required(Field::ServicedDate)?,
      interval_days:   required(Field::IntervalDays)?,
      kit_part_number: find(headers, Field::KitPartNumber),
      serial_number:   find(headers, Field::SerialNumber),
    })
  }

  /// Column index bound to `field`, if any.
  pub fn index_of(&self, field: Field) -> Option<usize> {
    match field {
      Field::Area => Some(self.area),
      Field::Category => Some(self.category),
      Field::Tag => Some(self.tag),
      Field::Function => Some(self.function),
      Field::ServicedDate => Some(self.serviced_date),
      Field::IntervalDays => Some(self.interval_days),
      Field::KitPartNumber => self.kit_part_number,
      Field::SerialNumber => self.serial_number,
    }
  }

  /// Whether column `index` is bound to any field.
  pub fn is_bound(&self, index: usize) -> bool {
    Field::REQUIRED
      .into_iter()
      .chain(Field::OPTIONAL)
      .any(|f| self.index_of(f) == Some(index))
  }
}
