//! SQL used by the SQLite store.
//!
//! The main table's layout belongs to whoever built the file; the store never
//! alters it. Only the history table is created, or widened, when it lacks
//! the columns the tracker writes.

pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
";

/// User tables in creation order.
pub const LIST_TABLES: &str = "
SELECT name FROM sqlite_master
 WHERE type = 'table'
   AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'
 ORDER BY rowid
";

/// Quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String { format!("\"{}\"", name.replace('"', "\"\"")) }

/// `CREATE TABLE IF NOT EXISTS` for a table with untyped columns.
pub fn create_table(name: &str, columns: &[String]) -> String {
  let cols = columns
    .iter()
    .map(|c| quote_ident(c))
    .collect::<Vec<_>>()
    .join(", ");
  format!("CREATE TABLE IF NOT EXISTS {} ({cols})", quote_ident(name))
}

pub fn select_all(name: &str) -> String {
  format!("SELECT * FROM {} ORDER BY rowid", quote_ident(name))
}

pub fn delete_all(name: &str) -> String { format!("DELETE FROM {}", quote_ident(name)) }

pub fn insert_row(name: &str, columns: &[String]) -> String {
  let cols = columns
    .iter()
    .map(|c| quote_ident(c))
    .collect::<Vec<_>>()
    .join(", ");
  let params = (1..=columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!("INSERT INTO {} ({cols}) VALUES ({params})", quote_ident(name))
}
