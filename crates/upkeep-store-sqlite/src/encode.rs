//! Conversions between core [`Cell`]s and SQLite values.
//!
//! SQLite columns are dynamically typed, so every storage class maps onto a
//! cell variant directly. Blobs have no cell counterpart and read as text.

use rusqlite::types::Value;
use upkeep_core::{cell::Cell, dataset::Table};

pub fn decode_cell(value: Value) -> Cell {
  match value {
    Value::Null => Cell::Empty,
    Value::Integer(n) => Cell::Integer(n),
    Value::Real(f) => Cell::Real(f),
    Value::Text(s) => Cell::Text(s),
    Value::Blob(b) => Cell::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}

pub fn encode_cell(cell: &Cell) -> Value {
  match cell {
    Cell::Empty => Value::Null,
    Cell::Integer(n) => Value::Integer(*n),
    Cell::Real(f) => Value::Real(*f),
    Cell::Text(s) => Value::Text(s.clone()),
  }
}

/// Read every row of `name` in rowid order.
pub fn read_table(conn: &rusqlite::Connection, name: &str) -> rusqlite::Result<Table> {
  let mut stmt = conn.prepare(&crate::schema::select_all(name))?;
  let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_owned).collect();
  let width = columns.len();

  let rows = stmt
    .query_map([], |row| {
      (0..width)
        .map(|i| row.get::<_, Value>(i).map(decode_cell))
        .collect::<rusqlite::Result<Vec<_>>>()
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Table { name: name.to_owned(), columns, rows })
}

/// Replace the contents of `table.name` with `table.rows`.
pub fn write_table(tx: &rusqlite::Transaction<'_>, table: &Table) -> rusqlite::Result<()> {
  tx.execute(&crate::schema::delete_all(&table.name), [])?;
  let mut stmt = tx.prepare(&crate::schema::insert_row(&table.name, &table.columns))?;
  for row in &table.rows {
    let values: Vec<Value> = row.iter().map(encode_cell).collect();
    stmt.execute(rusqlite::params_from_iter(values))?;
  }
  Ok(())
}
