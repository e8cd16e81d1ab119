//! Request handlers, one module per resource.

pub mod equipment;
pub mod service;
pub mod session;
pub mod summary;

use chrono::{Local, NaiveDateTime};
use upkeep_core::{dataset::Dataset, store::RecordStore};

use crate::{AppState, error::Error};

/// Load the whole dataset for this request.
pub(crate) async fn load<S>(state: &AppState<S>) -> Result<Dataset, Error>
where
  S: RecordStore + Clone + 'static,
{
  state.store.load().await.map_err(Error::store)
}

/// The instant statuses are computed against: `as_of` if given, else the
/// local wall clock.
pub(crate) fn now_or(as_of: Option<NaiveDateTime>) -> NaiveDateTime {
  as_of.unwrap_or_else(|| Local::now().naive_local())
}
