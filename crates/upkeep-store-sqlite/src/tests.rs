//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use upkeep_core::{
  cell::{Cell, Parsed},
  columns::Field,
  equipment::{Category, RecordUpdate},
  history::{NewHistoryEntry, ServiceType},
  store::RecordStore,
};

use crate::{Error, SqliteStore};

const FIXTURE: &str = r#"
CREATE TABLE "Processing Tracker" (
  "Location",
  "Equipment Type",
  " Valve Tag number ",
  "Function",
  "Last Serviced",
  "Interval (days)",
  "Kit Number",
  "SN",
  "Remarks"
);
INSERT INTO "Processing Tracker" VALUES
  ('North', 'Valve',      'BD711', 'Blowdown',  '2024-01-01', 30,   'KIT-7', NULL,     'spare on shelf'),
  ('North', 'Pump',       'P-101', 'Transfer',  '2024-01-01 00:00:00', 10.0, NULL, NULL, NULL),
  ('South', 'Instrument', 'PSTM',  'Pressure',  '2024-01-02', '90', NULL,    'SN-555', NULL),
  ('South', 'Valve',      'V006',  'Isolation', 'n/a',        NULL, NULL,    NULL,     NULL);
"#;

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.execute_batch(FIXTURE).await.expect("fixture");
  s
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

fn service(tag: &str) -> NewHistoryEntry {
  NewHistoryEntry {
    tag:           tag.into(),
    serviced_date: date(2024, 1, 28),
    interval_days: 45,
    service_type:  ServiceType::Breakdown,
  }
}

// ─── Load ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn load_resolves_synonym_headers() {
  let ds = store().await.load().await.unwrap();

  assert_eq!(ds.layout.name, "Processing Tracker");
  assert_eq!(ds.layout.columns[2], " Valve Tag number ");
  assert_eq!(ds.records.len(), 4);

  let bd = ds.get("BD711").unwrap();
  assert_eq!(bd.area, "North");
  assert_eq!(bd.category, Category::Valve);
  assert_eq!(bd.serviced_date, Parsed::Valid(date(2024, 1, 1)));
  assert_eq!(bd.interval_days, Parsed::Valid(30));
  assert_eq!(bd.kit_part_number.as_deref(), Some("KIT-7"));
  assert_eq!(bd.extra, vec![Cell::text("spare on shelf")]);

  let pump = ds.get("P-101").unwrap();
  assert_eq!(pump.serviced_date, Parsed::Valid(date(2024, 1, 1)));
  assert_eq!(pump.interval_days, Parsed::Valid(10));

  let pstm = ds.get("PSTM").unwrap();
  assert_eq!(pstm.interval_days, Parsed::Valid(90));
  assert_eq!(pstm.serial_number.as_deref(), Some("SN-555"));
}

#[tokio::test]
async fn unreadable_cells_do_not_abort_load() {
  let ds = store().await.load().await.unwrap();
  let v = ds.get("V006").unwrap();
  assert_eq!(v.serviced_date, Parsed::Invalid(Cell::text("n/a")));
  assert_eq!(v.interval_days, Parsed::Empty);
  assert_eq!(v.next_due(), None);
}

#[tokio::test]
async fn missing_history_loads_empty() {
  let ds = store().await.load().await.unwrap();
  assert!(ds.history.is_empty());
}

#[tokio::test]
async fn missing_required_column_is_schema_error() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.execute_batch(
    r#"CREATE TABLE "Equipment" ("Area", "Category", "Tag", "Function", "Notes");"#,
  )
  .await
  .unwrap();

  match s.load().await {
    Err(Error::Core(upkeep_core::Error::Schema(missing))) => {
      assert_eq!(missing, vec![Field::ServicedDate, Field::IntervalDays]);
    }
    other => panic!("expected schema error, got {other:?}"),
  }
}

#[tokio::test]
async fn empty_database_has_no_equipment_table() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  assert!(matches!(s.load().await, Err(Error::NoEquipmentTable)));
}

#[tokio::test]
async fn configured_table_is_used() {
  let s = store().await.with_main_table("Decommissioned");
  assert!(matches!(s.load().await, Err(Error::TableNotFound(t)) if t == "Decommissioned"));

  s.execute_batch(
    r#"CREATE TABLE "Decommissioned" ("Area", "Type", "Tag", "Function", "Serviced Date", "Interval");
       INSERT INTO "Decommissioned" VALUES ('East', 'Pump', 'P-900', 'Old', '2020-05-05', 365);"#,
  )
  .await
  .unwrap();
  let ds = s.load().await.unwrap();
  assert_eq!(ds.layout.name, "Decommissioned");
  assert_eq!(ds.records.len(), 1);
}

#[tokio::test]
async fn history_table_is_not_mistaken_for_main() {
  let s = SqliteStore::open_in_memory().await.unwrap();
  s.execute_batch(
    r#"CREATE TABLE "Service History" ("Tag", "Serviced Date", "Interval (days)", "Service Type", "Logged At");
       INSERT INTO "Service History" VALUES ('BD711', '2023-12-01', 30, 'Planned', '2023-12-01 10:00:00');"#,
  )
  .await
  .unwrap();
  s.execute_batch(FIXTURE).await.unwrap();

  let ds = s.load().await.unwrap();
  assert_eq!(ds.layout.name, "Processing Tracker");
  assert_eq!(ds.history.len(), 1);
  assert_eq!(ds.history[0].service_type, ServiceType::Planned);
}

// ─── Persist ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn persist_then_load_is_unchanged() {
  let s = store().await;
  let before = s.read_raw("Processing Tracker").await.unwrap();

  let ds = s.load().await.unwrap();
  s.persist(&ds).await.unwrap();

  // Every stored cell keeps its storage class and text, row order included.
  let after = s.read_raw("Processing Tracker").await.unwrap();
  assert_eq!(after, before);
  assert_eq!(after.rows[1][4], Cell::text("2024-01-01 00:00:00"));
  assert_eq!(after.rows[1][5], Cell::Real(10.0));
  assert_eq!(after.rows[2][5], Cell::text("90"));
  assert_eq!(s.load().await.unwrap(), ds);
}

#[tokio::test]
async fn update_rewrites_only_changed_cells() {
  let s = store().await;
  let before = s.read_raw("Processing Tracker").await.unwrap();

  let mut ds = s.load().await.unwrap();
  ds.update("P-101", RecordUpdate {
    interval_days: Some(14),
    ..Default::default()
  })
  .unwrap();
  s.persist(&ds).await.unwrap();

  let after = s.read_raw("Processing Tracker").await.unwrap();
  let mut expected = before.rows.clone();
  expected[1][5] = Cell::Integer(14);
  assert_eq!(after.rows, expected);
}

#[tokio::test]
async fn update_and_append_survive_reload() {
  let s = store().await;
  let mut ds = s.load().await.unwrap();

  ds.update("PSTM", RecordUpdate {
    serviced_date: Some(date(2024, 1, 28)),
    interval_days: Some(45),
    serial_number: Some("SN-777".into()),
    ..Default::default()
  })
  .unwrap();
  ds.append_history(service("PSTM"));
  s.persist(&ds).await.unwrap();

  let again = s.load().await.unwrap();
  assert_eq!(again, ds);
  let pstm = again.get("PSTM").unwrap();
  assert_eq!(pstm.serviced_date, Parsed::Valid(date(2024, 1, 28)));
  assert_eq!(pstm.serial_number.as_deref(), Some("SN-777"));
  assert_eq!(again.history.len(), 1);
  assert_eq!(again.history[0].service_type, ServiceType::Breakdown);
  assert!(again.history[0].logged_at.get().is_some());
}

#[tokio::test]
async fn appends_leave_earlier_history_untouched() {
  let s = store().await;

  let mut ds = s.load().await.unwrap();
  ds.append_history(service("BD711"));
  s.persist(&ds).await.unwrap();

  let first = s.load().await.unwrap().history;

  let mut ds = s.load().await.unwrap();
  ds.append_history(service("P-101"));
  s.persist(&ds).await.unwrap();

  let second = s.load().await.unwrap().history;
  assert_eq!(second.len(), first.len() + 1);
  assert_eq!(&second[..first.len()], &first[..]);
  assert_eq!(second[first.len()].tag, "P-101");
}

#[tokio::test]
async fn earlier_history_rows_survive_appends_verbatim() {
  let s = store().await;
  s.execute_batch(
    r#"CREATE TABLE "Service History" ("Tag", "Serviced Date", "Interval (days)", "Service Type", "Logged At", "Technician");
       INSERT INTO "Service History" VALUES
         ('BD711', '2023-12-01 00:00:00', '30', 'Planned', '2023-12-01 10:00:00.123456', 'jo');"#,
  )
  .await
  .unwrap();
  let before = s.read_raw("Service History").await.unwrap();

  let mut ds = s.load().await.unwrap();
  ds.append_history(service("BD711"));
  s.persist(&ds).await.unwrap();

  let after = s.read_raw("Service History").await.unwrap();
  assert_eq!(after.columns, before.columns);
  assert_eq!(after.rows.len(), 2);
  assert_eq!(after.rows[0], before.rows[0]);
  assert_eq!(after.rows[1][0], Cell::text("BD711"));
  assert_eq!(after.rows[1][5], Cell::Empty);
}

#[tokio::test]
async fn history_without_tag_column_uses_main_tag_header() {
  let s = store().await;
  s.execute_batch(
    r#"CREATE TABLE "Service History" ("Valve Tag number", "Serviced Date", "Interval (days)", "Service Type", "Logged At");
       INSERT INTO "Service History" VALUES ('PSTM', '2023-10-04', 90, 'Routine', '2023-10-04 08:00:00');"#,
  )
  .await
  .unwrap();

  let mut ds = s.load().await.unwrap();
  assert_eq!(ds.history_for("PSTM").len(), 1);

  ds.append_history(service("PSTM"));
  s.persist(&ds).await.unwrap();

  let raw = s.read_raw("Service History").await.unwrap();
  assert!(!raw.columns.iter().any(|c| c == "Tag"));
  assert_eq!(raw.rows[1][0], Cell::text("PSTM"));
  assert_eq!(s.load().await.unwrap().history_for("PSTM").len(), 2);
}

#[tokio::test]
async fn legacy_history_table_gains_missing_columns() {
  let s = store().await;
  s.execute_batch(
    r#"CREATE TABLE "Service History" ("Tag", "Serviced Date", "Interval (days)", "Service Type");
       INSERT INTO "Service History" VALUES ('V006', '2023-11-11', 30, 'Routine');"#,
  )
  .await
  .unwrap();

  let mut ds = s.load().await.unwrap();
  assert_eq!(ds.history.len(), 1);
  assert_eq!(ds.history[0].logged_at, Parsed::Empty);

  ds.append_history(service("V006"));
  s.persist(&ds).await.unwrap();

  let again = s.load().await.unwrap();
  assert_eq!(again.history.len(), 2);
  assert_eq!(again.history[0].service_type, ServiceType::Routine);
  assert!(again.history[1].logged_at.get().is_some());
}

#[tokio::test]
async fn persist_creates_tables_in_empty_database() {
  let source = store().await.load().await.unwrap();

  let s = SqliteStore::open_in_memory().await.unwrap();
  s.persist(&source).await.unwrap();
  let ds = s.load().await.unwrap();
  assert_eq!(ds, source);
}
