//! Handlers for `/equipment` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/equipment` | `?tag=&area=&category=&status=&as_of=&limit=&offset=` |
//! | `GET`  | `/equipment/{tag}` | 404 if no record has this tag |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::header,
  response::{IntoResponse, Response},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use upkeep_core::{
  dataset::{Dataset, EquipmentQuery, EquipmentView},
  history::ServiceHistoryEntry,
  status::StatusFilter,
  store::RecordStore,
};

use crate::{
  AppState,
  auth::Authenticated,
  error::Error,
  etag::compute_etag,
  handlers::{load, now_or},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub tag:      Option<String>,
  pub area:     Option<String>,
  pub category: Option<String>,
  #[serde(default)]
  pub status:   StatusFilter,
  pub as_of:    Option<NaiveDateTime>,
  pub limit:    Option<usize>,
  pub offset:   Option<usize>,
}

/// `GET /equipment`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Authenticated(_session): Authenticated,
  Query(params): Query<ListParams>,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let dataset = load(&state).await?;
  let now     = now_or(params.as_of);
  let query   = EquipmentQuery {
    tag:      params.tag,
    area:     params.area,
    category: params.category,
    status:   params.status,
    limit:    params.limit,
    offset:   params.offset,
  };
  let page = dataset.query(&query, now);
  Ok(([(header::ETAG, compute_etag(&dataset))], Json(page)).into_response())
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct DetailParams {
  pub as_of: Option<NaiveDateTime>,
}

/// A record with its derived state and its service history, newest first.
#[derive(Debug, Serialize)]
pub struct EquipmentDetail {
  #[serde(flatten)]
  pub view:    EquipmentView,
  pub history: Vec<ServiceHistoryEntry>,
}

impl EquipmentDetail {
  pub fn build(dataset: &Dataset, tag: &str, now: NaiveDateTime) -> Result<Self, Error> {
    let record = dataset
      .get(tag)
      .ok_or_else(|| Error::NotFound(format!("equipment not found: {tag}")))?;
    Ok(Self {
      view:    EquipmentView::new(record, now),
      history: dataset.history_for(tag).into_iter().cloned().collect(),
    })
  }
}

/// `GET /equipment/{tag}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Authenticated(_session): Authenticated,
  Path(tag): Path<String>,
  Query(params): Query<DetailParams>,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let dataset = load(&state).await?;
  let detail  = EquipmentDetail::build(&dataset, &tag, now_or(params.as_of))?;
  Ok(([(header::ETAG, compute_etag(&dataset))], Json(detail)).into_response())
}
