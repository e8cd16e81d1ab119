//! SQLite backend for the Upkeep equipment tracker.
//!
//! The database file holds the two tables of the tracker: the main equipment
//! table (any name, any column spelling the core can resolve) and the
//! `Service History` table. Wraps [`tokio_rusqlite`] so all database access
//! runs on a dedicated thread without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
