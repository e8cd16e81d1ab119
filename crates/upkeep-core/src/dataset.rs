//! The in-memory dataset: equipment table plus service history.
//!
//! A [`Dataset`] is loaded wholesale from a [`crate::store::RecordStore`],
//! mutated in memory, and persisted by rewriting both tables.

use std::collections::BTreeSet;

use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound as _};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  cell::{Cell, Parsed},
  columns::{ColumnMap, Field},
  equipment::{EquipmentRecord, RecordUpdate},
  history::{HISTORY_TABLE, HistoryLayout, NewHistoryEntry, ServiceHistoryEntry},
  status::{Status, StatusCounts, StatusFilter},
};

// ─── Raw tables ──────────────────────────────────────────────────────────────

/// A named grid of cells exactly as a backend reads or writes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
  pub name:    String,
  pub columns: Vec<String>,
  pub rows:    Vec<Vec<Cell>>,
}

/// The main table's name and header row, together with the resolved binding
/// of interpreted fields to columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
  pub name:    String,
  pub columns: Vec<String>,
  pub map:     ColumnMap,
}

// ─── Dataset ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
  pub layout:         TableLayout,
  pub records:        Vec<EquipmentRecord>,
  pub history_layout: HistoryLayout,
  pub history:        Vec<ServiceHistoryEntry>,
}

impl Dataset {
  /// Interpret raw tables. A missing history table yields an empty history.
  ///
  /// Fails with [`Error::Schema`] if any required column of `main` cannot be
  /// resolved.
  pub fn from_tables(main: Table, history: Option<Table>) -> Result<Self> {
    let map = ColumnMap::resolve(&main.columns)?;
    let width = main.columns.len();

    let records: Vec<EquipmentRecord> = main
      .rows
      .iter()
      .map(|row| EquipmentRecord::from_row(&map, &padded(row, width)))
      .collect();

    let unreadable = records
      .iter()
      .filter(|r| {
        matches!(r.serviced_date, Parsed::Invalid(_))
          || matches!(r.interval_days, Parsed::Invalid(_))
      })
      .count();
    if unreadable > 0 {
      tracing::debug!(
        table = %main.name,
        unreadable,
        "rows with unreadable serviced date or interval"
      );
    }

    let (history_layout, history) = match history {
      Some(table) => {
        let layout = HistoryLayout::resolve(table.columns, &main.columns[map.tag]);
        let width = layout.columns.len();
        let entries = table
          .rows
          .iter()
          .map(|row| ServiceHistoryEntry::from_row(&layout, &padded(row, width)))
          .collect();
        (layout, entries)
      }
      None => (HistoryLayout::default(), Vec::new()),
    };

    tracing::debug!(
      table = %main.name,
      records = records.len(),
      history = history.len(),
      "dataset loaded"
    );

    Ok(Self {
      layout: TableLayout {
        name: main.name,
        columns: main.columns,
        map,
      },
      records,
      history_layout,
      history,
    })
  }

  /// The main table as raw cells, in the stored header order.
  pub fn main_table(&self) -> Table {
    let width = self.layout.columns.len();
    Table {
      name:    self.layout.name.clone(),
      columns: self.layout.columns.clone(),
      rows:    self
        .records
        .iter()
        .map(|r| r.to_row(&self.layout.map, width))
        .collect(),
    }
  }

  /// The history table as raw cells. Earlier entries come back exactly as
  /// they were read.
  pub fn history_table(&self) -> Table {
    Table {
      name:    HISTORY_TABLE.to_owned(),
      columns: self.history_layout.columns.clone(),
      rows:    self
        .history
        .iter()
        .map(|e| e.to_row(&self.history_layout))
        .collect(),
    }
  }

  // ── Lookups ─────────────────────────────────────────────────────────────

  /// The first record with this tag.
  pub fn get(&self, tag: &str) -> Option<&EquipmentRecord> {
    self.records.iter().find(|r| r.tag == tag)
  }

  /// History entries for `tag`, most recently serviced first. Entries with
  /// no readable serviced date sort last; ties keep log order.
  pub fn history_for(&self, tag: &str) -> Vec<&ServiceHistoryEntry> {
    let mut entries: Vec<&ServiceHistoryEntry> =
      self.history.iter().filter(|e| e.tag == tag).collect();
    entries.sort_by(|a, b| b.serviced_date.get().cmp(&a.serviced_date.get()));
    entries
  }

  // ── Mutations ───────────────────────────────────────────────────────────

  /// Apply `changes` to the record with `tag`.
  ///
  /// Every change is validated before any is applied: on error the record is
  /// left untouched.
  pub fn update(&mut self, tag: &str, changes: RecordUpdate) -> Result<&EquipmentRecord> {
    let map = &self.layout.map;
    let width = self.layout.columns.len();
    let table = &self.layout.name;
    let record = self
      .records
      .iter_mut()
      .find(|r| r.tag == tag)
      .ok_or_else(|| Error::NotFound(tag.to_owned()))?;

    if let Some(days) = changes.interval_days
      && days < 1
    {
      return Err(Error::InvalidInterval(days));
    }
    if changes.kit_part_number.is_some() {
      if !record.category.has_service_kit() {
        return Err(Error::NotApplicable {
          field:    Field::KitPartNumber,
          category: record.category.to_string(),
        });
      }
      if map.kit_part_number.is_none() {
        return Err(Error::MissingColumn {
          table: table.clone(),
          field: Field::KitPartNumber,
        });
      }
    }
    if changes.serial_number.is_some() {
      if !record.category.has_serial_number() {
        return Err(Error::NotApplicable {
          field:    Field::SerialNumber,
          category: record.category.to_string(),
        });
      }
      if map.serial_number.is_none() {
        return Err(Error::MissingColumn {
          table: table.clone(),
          field: Field::SerialNumber,
        });
      }
    }

    if let Some(date) = changes.serviced_date {
      record.serviced_date = Parsed::Valid(date);
    }
    if let Some(days) = changes.interval_days {
      record.interval_days = Parsed::Valid(days);
    }
    if let Some(kit) = changes.kit_part_number {
      record.kit_part_number = (!kit.is_empty()).then_some(kit);
    }
    if let Some(serial) = changes.serial_number {
      record.serial_number = (!serial.is_empty()).then_some(serial);
    }
    record.source = record.to_row(map, width);

    Ok(record)
  }

  /// Append a history entry stamped with the current local time.
  pub fn append_history(&mut self, entry: NewHistoryEntry) -> &ServiceHistoryEntry {
    self.append_history_at(entry, Local::now().naive_local())
  }

  /// Append a history entry with an explicit `logged_at`, truncated to whole
  /// seconds to match the stored precision.
  pub fn append_history_at(
    &mut self,
    entry: NewHistoryEntry,
    logged_at: NaiveDateTime,
  ) -> &ServiceHistoryEntry {
    let mut entry = ServiceHistoryEntry {
      tag:           entry.tag,
      serviced_date: Parsed::Valid(entry.serviced_date),
      interval_days: Parsed::Valid(entry.interval_days),
      service_type:  entry.service_type,
      logged_at:     Parsed::Valid(logged_at.trunc_subsecs(0)),
      source:        Vec::new(),
    };
    entry.source = entry.to_row(&self.history_layout);
    self.history.push(entry);
    &self.history[self.history.len() - 1]
  }

  // ── Queries ─────────────────────────────────────────────────────────────

  /// Status tallies over every record.
  pub fn counts(&self, now: NaiveDateTime) -> StatusCounts {
    StatusCounts::tally(self.records.iter().map(|r| r.status(now)))
  }

  /// Sorted distinct non-empty areas.
  pub fn areas(&self) -> Vec<String> {
    distinct(self.records.iter().map(|r| r.area.as_str()))
  }

  /// Sorted distinct non-empty categories.
  pub fn categories(&self) -> Vec<String> {
    distinct(self.records.iter().map(|r| r.category.as_str()))
  }

  /// Filter and page through the records in table order.
  pub fn query(&self, query: &EquipmentQuery, now: NaiveDateTime) -> Page {
    let needle = query
      .tag
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(str::to_lowercase);

    let matching: Vec<EquipmentView> = self
      .records
      .iter()
      .filter(|r| query.area.as_deref().is_none_or(|a| r.area == a))
      .filter(|r| query.category.as_deref().is_none_or(|c| r.category.as_str() == c))
      .filter(|r| {
        needle
          .as_deref()
          .is_none_or(|n| r.tag.to_lowercase().contains(n))
      })
      .map(|r| EquipmentView::new(r, now))
      .filter(|v| query.status.matches(v.status))
      .collect();

    let total = matching.len();
    let items = matching
      .into_iter()
      .skip(query.offset.unwrap_or(0))
      .take(query.limit.unwrap_or(DEFAULT_PAGE_SIZE))
      .collect();

    Page { total, items }
  }
}

/// `row` widened with empty cells to at least `width` columns.
fn padded(row: &[Cell], width: usize) -> Vec<Cell> {
  let mut row = row.to_vec();
  if row.len() < width {
    row.resize(width, Cell::Empty);
  }
  row
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
  values
    .filter(|v| !v.is_empty())
    .collect::<BTreeSet<_>>()
    .into_iter()
    .map(str::to_owned)
    .collect()
}

// ─── Query types ─────────────────────────────────────────────────────────────

pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Parameters for [`Dataset::query`].
#[derive(Debug, Clone, Default)]
pub struct EquipmentQuery {
  /// Case-insensitive substring of the tag.
  pub tag:      Option<String>,
  /// Exact area.
  pub area:     Option<String>,
  /// Exact category label.
  pub category: Option<String>,
  pub status:   StatusFilter,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// A record together with its derived maintenance state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquipmentView {
  #[serde(flatten)]
  pub record:   EquipmentRecord,
  pub status:   Status,
  pub next_due: Option<NaiveDate>,
}

impl EquipmentView {
  pub fn new(record: &EquipmentRecord, now: NaiveDateTime) -> Self {
    Self {
      record:   record.clone(),
      status:   record.status(now),
      next_due: record.next_due(),
    }
  }
}

/// One page of query results; `total` counts all matches.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
  pub total: usize,
  pub items: Vec<EquipmentView>,
}

#[cfg(test)]
mod tests {
  use chrono::NaiveTime;

  use super::*;
  use crate::{
    equipment::Category,
    history::{HISTORY_COLUMNS, ServiceType},
  };

  fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn now() -> NaiveDateTime { date(2024, 1, 29).and_time(NaiveTime::MIN) }

  fn row(area: &str, cat: &str, tag: &str, serviced: &str, interval: i64) -> Vec<Cell> {
    vec![
      Cell::text(area),
      Cell::text(cat),
      Cell::text(tag),
      Cell::text(format!("{tag} duty")),
      Cell::text(serviced),
      Cell::Integer(interval),
      Cell::Empty,
      Cell::Empty,
      Cell::text("keep me"),
    ]
  }

  fn main_table() -> Table {
    Table {
      name:    "Equipment".into(),
      columns: [
        "Area",
        "Category",
        "Tag",
        "Function",
        "Serviced Date",
        "Interval (days)",
        "Part Number",
        "Serial Number",
        "Notes",
      ]
      .map(String::from)
      .to_vec(),
      rows:    vec![
        // due 2024-01-31 → due soon
        row("North", "Valve", "V-001", "2024-01-01", 30),
        // due 2024-01-11 → overdue
        row("North", "Pump", "P-101", "2024-01-01", 10),
        // due 2024-04-01 → ok
        row("South", "Instrument", "TI-7", "2024-01-02", 90),
        // unreadable date → unknown
        row("South", "Valve", "V-002", "soon", 30),
      ],
    }
  }

  fn dataset() -> Dataset { Dataset::from_tables(main_table(), None).unwrap() }

  fn service(tag: &str) -> NewHistoryEntry {
    NewHistoryEntry {
      tag:           tag.into(),
      serviced_date: date(2024, 1, 28),
      interval_days: 30,
      service_type:  ServiceType::Planned,
    }
  }

  #[test]
  fn missing_history_is_empty() {
    let ds = dataset();
    assert!(ds.history.is_empty());
    let history = ds.history_table();
    assert_eq!(history.name, HISTORY_TABLE);
    assert_eq!(history.columns, HISTORY_COLUMNS.map(String::from).to_vec());
    assert!(history.rows.is_empty());
  }

  #[test]
  fn schema_error_stops_load() {
    let mut table = main_table();
    table.columns[4] = "Commissioned".into();
    assert!(matches!(
      Dataset::from_tables(table, None),
      Err(Error::Schema(f)) if f == vec![Field::ServicedDate]
    ));
  }

  #[test]
  fn unreadable_rows_do_not_abort_load() {
    let ds = dataset();
    assert_eq!(ds.records.len(), 4);
    assert_eq!(ds.get("V-002").unwrap().status(now()), Status::Unknown);
  }

  #[test]
  fn main_table_round_trips_unchanged() {
    let table = main_table();
    let ds = Dataset::from_tables(table.clone(), None).unwrap();
    assert_eq!(ds.main_table(), table);
    let again = Dataset::from_tables(ds.main_table(), Some(ds.history_table())).unwrap();
    assert_eq!(again, ds);
  }

  #[test]
  fn update_applies_fields() {
    let mut ds = dataset();
    let rec = ds
      .update("V-001", RecordUpdate {
        serviced_date: Some(date(2024, 1, 28)),
        interval_days: Some(60),
        kit_part_number: Some("KIT-42".into()),
        serial_number: None,
      })
      .unwrap();
    assert_eq!(rec.serviced_date, Parsed::Valid(date(2024, 1, 28)));
    assert_eq!(rec.interval_days, Parsed::Valid(60));
    assert_eq!(rec.kit_part_number.as_deref(), Some("KIT-42"));
    assert_eq!(rec.status(now()), Status::Ok);
    assert_eq!(ds.main_table().rows[0][6], Cell::text("KIT-42"));
    assert_eq!(ds.main_table().rows[0][8], Cell::text("keep me"));
  }

  #[test]
  fn update_touches_only_the_changed_cells() {
    let mut table = main_table();
    table.rows[1][4] = Cell::text("2024-01-01 00:00:00");
    table.rows[1][5] = Cell::Real(10.0);
    table.rows[1][2] = Cell::Integer(101);
    let mut ds = Dataset::from_tables(table.clone(), None).unwrap();
    assert_eq!(ds.main_table(), table);

    ds.update("101", RecordUpdate {
      interval_days: Some(14),
      ..Default::default()
    })
    .unwrap();
    let mut expected = table.rows[1].clone();
    expected[5] = Cell::Integer(14);
    assert_eq!(ds.main_table().rows[1], expected);
    assert_eq!(ds.main_table().rows[0], table.rows[0]);
  }

  #[test]
  fn existing_history_is_rewritten_verbatim() {
    let history = Table {
      name:    HISTORY_TABLE.into(),
      columns: ["Tag", "Serviced Date", "Interval (days)", "Service Type", "Logged At", "By"]
        .map(String::from)
        .to_vec(),
      rows:    vec![vec![
        Cell::text("V-001"),
        Cell::text("2023-12-01 00:00:00"),
        Cell::text("30"),
        Cell::text("Planned"),
        Cell::text("2023-12-01 10:00:00.123456"),
        Cell::text("jo"),
      ]],
    };
    let mut ds = Dataset::from_tables(main_table(), Some(history.clone())).unwrap();
    ds.append_history(service("P-101"));

    let written = ds.history_table();
    assert_eq!(written.columns, history.columns);
    assert_eq!(written.rows[0], history.rows[0]);
    assert_eq!(written.rows[1][0], Cell::text("P-101"));
    assert_eq!(written.rows[1][5], Cell::Empty);
  }

  #[test]
  fn history_keyed_by_main_tag_column() {
    let history = Table {
      name:    HISTORY_TABLE.into(),
      columns: ["Tag Number", "Serviced Date", "Interval (days)", "Service Type"]
        .map(String::from)
        .to_vec(),
      rows:    vec![vec![
        Cell::text("V-001"),
        Cell::text("2023-12-01"),
        Cell::Integer(30),
        Cell::text("Routine"),
      ]],
    };
    let mut table = main_table();
    table.columns[2] = "Tag Number".into();
    let mut ds = Dataset::from_tables(table, Some(history)).unwrap();
    assert_eq!(ds.history_for("V-001").len(), 1);

    ds.append_history(service("V-001"));
    let written = ds.history_table();
    assert_eq!(
      written.columns,
      ["Tag Number", "Serviced Date", "Interval (days)", "Service Type", "Logged At"]
        .map(String::from)
        .to_vec()
    );
    assert_eq!(written.rows[1][0], Cell::text("V-001"));
    assert_eq!(ds.history_for("V-001").len(), 2);
  }

  #[test]
  fn update_unknown_tag_is_not_found() {
    let mut ds = dataset();
    let before = ds.clone();
    let err = ds.update("NOPE", RecordUpdate::default()).unwrap_err();
    assert!(matches!(err, Error::NotFound(t) if t == "NOPE"));
    assert_eq!(ds, before);
  }

  #[test]
  fn invalid_update_changes_nothing() {
    let mut ds = dataset();
    let before = ds.clone();

    let err = ds
      .update("TI-7", RecordUpdate {
        serviced_date: Some(date(2024, 1, 28)),
        kit_part_number: Some("KIT-1".into()),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, Error::NotApplicable { field: Field::KitPartNumber, .. }));

    let err = ds
      .update("V-001", RecordUpdate {
        interval_days: Some(0),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, Error::InvalidInterval(0)));

    assert_eq!(ds, before);
  }

  #[test]
  fn serial_requires_column() {
    let mut table = main_table();
    table.columns[7] = "Asset Owner".into();
    let mut ds = Dataset::from_tables(table, None).unwrap();
    let err = ds
      .update("TI-7", RecordUpdate {
        serial_number: Some("SN-1".into()),
        ..Default::default()
      })
      .unwrap_err();
    assert!(matches!(err, Error::MissingColumn { field: Field::SerialNumber, .. }));
  }

  #[test]
  fn append_history_is_additive() {
    let mut ds = dataset();
    let at = date(2024, 1, 28).and_hms_opt(9, 30, 15).unwrap();
    ds.append_history_at(service("V-001"), at);
    let before = ds.history.clone();

    let entry = ds.append_history(service("P-101")).clone();
    assert_eq!(ds.history.len(), before.len() + 1);
    assert_eq!(&ds.history[..before.len()], &before[..]);
    assert_eq!(entry.tag, "P-101");
    assert!(entry.logged_at.get().unwrap() > at);
  }

  #[test]
  fn logged_at_has_second_precision() {
    let mut ds = dataset();
    let at = date(2024, 1, 28)
      .and_hms_milli_opt(9, 30, 15, 750)
      .unwrap();
    let entry = ds.append_history_at(service("V-001"), at);
    assert_eq!(
      entry.logged_at,
      Parsed::Valid(date(2024, 1, 28).and_hms_opt(9, 30, 15).unwrap())
    );
  }

  #[test]
  fn history_newest_first() {
    let mut ds = dataset();
    let at = now();
    for (d, tag) in [(5, "V-001"), (20, "V-001"), (12, "P-101"), (9, "V-001")] {
      ds.append_history_at(
        NewHistoryEntry {
          serviced_date: date(2024, 1, d),
          ..service(tag)
        },
        at,
      );
    }
    let dates: Vec<_> = ds
      .history_for("V-001")
      .iter()
      .map(|e| e.serviced_date.get().unwrap())
      .collect();
    assert_eq!(dates, vec![date(2024, 1, 20), date(2024, 1, 9), date(2024, 1, 5)]);
  }

  #[test]
  fn query_filters() {
    let ds = dataset();

    let page = ds.query(&EquipmentQuery::default(), now());
    assert_eq!(page.total, 4);

    let page = ds.query(
      &EquipmentQuery {
        tag: Some(" v-00 ".into()),
        ..Default::default()
      },
      now(),
    );
    let tags: Vec<_> = page.items.iter().map(|v| v.record.tag.as_str()).collect();
    assert_eq!(tags, vec!["V-001", "V-002"]);

    let page = ds.query(
      &EquipmentQuery {
        area: Some("North".into()),
        status: StatusFilter::OverdueOrDueSoon,
        ..Default::default()
      },
      now(),
    );
    assert_eq!(page.total, 2);

    let page = ds.query(
      &EquipmentQuery {
        category: Some("Valve".into()),
        status: StatusFilter::Overdue,
        ..Default::default()
      },
      now(),
    );
    assert_eq!(page.total, 0);
  }

  #[test]
  fn query_pages() {
    let ds = dataset();
    let page = ds.query(
      &EquipmentQuery {
        limit: Some(2),
        offset: Some(1),
        ..Default::default()
      },
      now(),
    );
    assert_eq!(page.total, 4);
    let tags: Vec<_> = page.items.iter().map(|v| v.record.tag.as_str()).collect();
    assert_eq!(tags, vec!["P-101", "TI-7"]);
  }

  #[test]
  fn counts_and_facets() {
    let ds = dataset();
    let counts = ds.counts(now());
    assert_eq!(
      (counts.total, counts.overdue, counts.due_soon, counts.ok, counts.unknown),
      (4, 1, 1, 1, 1)
    );
    assert_eq!(ds.areas(), vec!["North", "South"]);
    assert_eq!(ds.categories(), vec!["Instrument", "Pump", "Valve"]);
    assert_eq!(ds.get("TI-7").unwrap().category, Category::Instrument);
  }
}
