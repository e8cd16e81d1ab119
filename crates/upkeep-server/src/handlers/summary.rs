//! `GET /api/summary`: dashboard tallies and browse pickers.

use axum::{
  Json,
  extract::{Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use upkeep_core::{status::StatusCounts, store::RecordStore};

use crate::{
  AppState,
  auth::Authenticated,
  error::Error,
  etag::compute_etag,
  handlers::{load, now_or},
};

#[derive(Debug, Default, Deserialize)]
pub struct SummaryParams {
  pub as_of: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
  pub as_of:               NaiveDateTime,
  pub counts:              StatusCounts,
  pub overdue_or_due_soon: usize,
  pub areas:               Vec<String>,
  pub categories:          Vec<String>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Authenticated(_session): Authenticated,
  Query(params): Query<SummaryParams>,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let dataset = load(&state).await?;
  let now     = now_or(params.as_of);
  let counts  = dataset.counts(now);

  let summary = Summary {
    as_of: now,
    counts,
    overdue_or_due_soon: counts.overdue_or_due_soon(),
    areas: dataset.areas(),
    categories: dataset.categories(),
  };
  Ok(([(header::ETAG, compute_etag(&dataset))], Json(summary)).into_response())
}
