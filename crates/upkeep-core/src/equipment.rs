//! Equipment records: one row of the main table.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  cell::{Cell, Parsed, encode_date, encode_interval, parse_date, parse_interval, write_back},
  columns::ColumnMap,
};

// ─── Category ────────────────────────────────────────────────────────────────

/// Equipment category. Only the named variants unlock category-specific
/// fields; anything else is carried through as free text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Valve,
  Pump,
  Instrument,
  Other(String),
}

impl Category {
  /// Exact, case-sensitive match on the category label.
  pub fn parse(s: &str) -> Self {
    match s {
      "Valve" => Self::Valve,
      "Pump" => Self::Pump,
      "Instrument" => Self::Instrument,
      other => Self::Other(other.to_owned()),
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Valve => "Valve",
      Self::Pump => "Pump",
      Self::Instrument => "Instrument",
      Self::Other(s) => s,
    }
  }

  /// Valves and pumps carry a service kit part number.
  pub fn has_service_kit(&self) -> bool { matches!(self, Self::Valve | Self::Pump) }

  /// Instruments carry a serial number.
  pub fn has_serial_number(&self) -> bool { matches!(self, Self::Instrument) }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

// ─── EquipmentRecord ─────────────────────────────────────────────────────────

/// One item of equipment. `status` is never stored; see [`crate::status`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentRecord {
  /// Unique key within the table.
  pub tag:             String,
  pub area:            String,
  pub category:        Category,
  pub function:        String,
  pub serviced_date:   Parsed<NaiveDate>,
  pub interval_days:   Parsed<i64>,
  pub kit_part_number: Option<String>,
  pub serial_number:   Option<String>,
  /// Cells of columns the tracker does not interpret, in header order.
  #[serde(default)]
  pub extra:           Vec<Cell>,
  /// The row as it was read (or last written). Cells whose meaning has not
  /// changed are written back from here untouched.
  #[serde(skip)]
  pub source:          Vec<Cell>,
}

fn optional_text(cell: &Cell) -> Option<String> {
  let text = cell.to_text();
  (!text.is_empty()).then_some(text)
}

impl EquipmentRecord {
  /// Interpret a raw row. Short rows read as if padded with empty cells.
  pub fn from_row(map: &ColumnMap, row: &[Cell]) -> Self {
    let empty = Cell::Empty;
    let at = |i: usize| row.get(i).unwrap_or(&empty);

    let extra = (0..row.len())
      .filter(|i| !map.is_bound(*i))
      .map(|i| row[i].clone())
      .collect();

    Self {
      tag:             at(map.tag).to_text(),
      area:            at(map.area).to_text(),
      category:        Category::parse(&at(map.category).to_text()),
      function:        at(map.function).to_text(),
      serviced_date:   parse_date(at(map.serviced_date)),
      interval_days:   parse_interval(at(map.interval_days)),
      kit_part_number: map.kit_part_number.and_then(|i| optional_text(at(i))),
      serial_number:   map.serial_number.and_then(|i| optional_text(at(i))),
      extra,
      source:          row.to_vec(),
    }
  }

  /// Rebuild the raw row for a table with `width` columns. Only fields whose
  /// value differs from what their source cell reads as are re-encoded.
  pub fn to_row(&self, map: &ColumnMap, width: usize) -> Vec<Cell> {
    let empty = Cell::Empty;
    let mut extra = self.extra.iter().cloned();
    let text = |c: &Cell| c.to_text();
    (0..width)
      .map(|i| {
        let raw = self.source.get(i).unwrap_or(&empty);
        if i == map.tag {
          write_back(raw, text, &self.tag, || Cell::text(&self.tag))
        } else if i == map.area {
          write_back(raw, text, &self.area, || Cell::text(&self.area))
        } else if i == map.category {
          write_back(raw, |c| Category::parse(&c.to_text()), &self.category, || {
            Cell::text(self.category.as_str())
          })
        } else if i == map.function {
          write_back(raw, text, &self.function, || Cell::text(&self.function))
        } else if i == map.serviced_date {
          write_back(raw, parse_date, &self.serviced_date, || encode_date(&self.serviced_date))
        } else if i == map.interval_days {
          write_back(raw, parse_interval, &self.interval_days, || {
            encode_interval(&self.interval_days)
          })
        } else if Some(i) == map.kit_part_number {
          write_back(raw, optional_text, &self.kit_part_number, || {
            self.kit_part_number.clone().map(Cell::text).unwrap_or_default()
          })
        } else if Some(i) == map.serial_number {
          write_back(raw, optional_text, &self.serial_number, || {
            self.serial_number.clone().map(Cell::text).unwrap_or_default()
          })
        } else {
          extra.next().unwrap_or_default()
        }
      })
      .collect()
  }
}

// ─── RecordUpdate ────────────────────────────────────────────────────────────

/// Field changes applied by [`crate::dataset::Dataset::update`]. `None` leaves
/// a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordUpdate {
  pub serviced_date:   Option<NaiveDate>,
  pub interval_days:   Option<i64>,
  pub kit_part_number: Option<String>,
  pub serial_number:   Option<String>,
}
