//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use upkeep_core::{
  dataset::{Dataset, Table},
  history::HISTORY_TABLE,
  store::RecordStore,
};

use crate::{
  Error, Result,
  encode::{read_table, write_table},
  schema::{LIST_TABLES, PRAGMAS, create_table, quote_ident},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An equipment tracker backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  /// Name of the equipment table; `None` picks the first non-history table.
  main_table: Option<String>,
}

impl SqliteStore {
  /// Open (or create) a store at `path`.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, main_table: None };
    store.init().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, main_table: None };
    store.init().await?;
    Ok(store)
  }

  /// Use the table called `name` as the equipment table.
  pub fn with_main_table(mut self, name: impl Into<String>) -> Self {
    self.main_table = Some(name.into());
    self
  }

  /// Run raw SQL against the database; tests use it to lay out fixture tables.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: &str) -> Result<()> {
    let sql = sql.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read a table's raw cells, bypassing interpretation.
  #[cfg(test)]
  pub(crate) async fn read_raw(&self, name: &str) -> Result<Table> {
    let name = name.to_owned();
    let table = self
      .conn
      .call(move |conn| Ok(read_table(conn, &name)?))
      .await?;
    Ok(table)
  }

  async fn init(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Read the main table and, if present, the history table.
  async fn read_tables(&self) -> Result<(Table, Option<Table>)> {
    let configured = self.main_table.clone();

    let tables: Option<(Table, Option<Table>)> = self
      .conn
      .call(move |conn| {
        let names: Vec<String> = {
          let mut stmt = conn.prepare(LIST_TABLES)?;
          let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          names
        };

        let is_history = |name: &str| name.eq_ignore_ascii_case(HISTORY_TABLE);
        let main_name = match &configured {
          Some(wanted) => names.iter().find(|n| n.eq_ignore_ascii_case(wanted)),
          None => names.iter().find(|n| !is_history(n.as_str())),
        };
        let Some(main_name) = main_name else {
          return Ok(None);
        };

        let main = read_table(conn, main_name)?;
        let history = match names.iter().find(|n| is_history(n.as_str())) {
          Some(name) => Some(read_table(conn, name)?),
          None => None,
        };
        Ok(Some((main, history)))
      })
      .await?;

    tables.ok_or_else(|| match &self.main_table {
      Some(name) => Error::TableNotFound(name.clone()),
      None => Error::NoEquipmentTable,
    })
  }
}

/// Add any of `columns` that `table` lacks. Existing columns are left alone.
fn ensure_columns(
  conn: &rusqlite::Connection,
  table: &str,
  columns: &[String],
) -> rusqlite::Result<()> {
  let existing: Vec<String> = {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let names = stmt
      .query_map([], |row| row.get::<_, String>(1))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    names
  };
  for column in columns {
    if !existing.iter().any(|e| e.eq_ignore_ascii_case(column)) {
      conn.execute(
        &format!(
          "ALTER TABLE {} ADD COLUMN {}",
          quote_ident(table),
          quote_ident(column)
        ),
        [],
      )?;
    }
  }
  Ok(())
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  async fn load(&self) -> Result<Dataset> {
    let (main, history) = self.read_tables().await?;
    Ok(Dataset::from_tables(main, history)?)
  }

  /// Both tables are rewritten in one transaction: either both land or
  /// neither does.
  async fn persist(&self, dataset: &Dataset) -> Result<()> {
    let main    = dataset.main_table();
    let history = dataset.history_table();
    let counts  = (main.rows.len(), history.rows.len());
    let name    = main.name.clone();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(&create_table(&main.name, &main.columns))?;
        tx.execute_batch(&create_table(&history.name, &history.columns))?;
        ensure_columns(&tx, &history.name, &history.columns)?;
        write_table(&tx, &main)?;
        write_table(&tx, &history)?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    tracing::info!(
      table = %name,
      records = counts.0,
      history = counts.1,
      "dataset persisted"
    );
    Ok(())
  }
}
