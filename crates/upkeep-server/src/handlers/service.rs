//! `POST /equipment/{tag}/service`: log a completed service.
//!
//! Updates the record's serviced date and interval (and, where the category
//! allows it, kit or serial number), appends one history entry, and rewrites
//! the store. Supervisors only.

use axum::{
  Json,
  extract::{Path, State},
  http::{HeaderMap, header},
  response::{IntoResponse, Response},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use upkeep_core::{
  equipment::RecordUpdate,
  history::{NewHistoryEntry, ServiceType},
  store::RecordStore,
};

use crate::{
  AppState,
  auth::Supervisor,
  error::Error,
  etag::{check_if_match, compute_etag},
  handlers::{equipment::EquipmentDetail, load},
};

#[derive(Debug, Deserialize)]
pub struct ServiceBody {
  pub serviced_date:   NaiveDate,
  pub interval_days:   i64,
  pub service_type:    String,
  #[serde(default)]
  pub kit_part_number: Option<String>,
  #[serde(default)]
  pub serial_number:   Option<String>,
}

/// Only the three known service types may be logged through the API.
fn parse_service_type(s: &str) -> Result<ServiceType, Error> {
  let s = s.trim();
  [ServiceType::Planned, ServiceType::Breakdown, ServiceType::Routine]
    .into_iter()
    .find(|t| t.as_str().eq_ignore_ascii_case(s))
    .ok_or_else(|| Error::BadRequest(format!("unknown service type: {s:?}")))
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Supervisor(session): Supervisor,
  Path(tag): Path<String>,
  headers: HeaderMap,
  Json(body): Json<ServiceBody>,
) -> Result<Response, Error>
where
  S: RecordStore + Clone + 'static,
{
  let service_type = parse_service_type(&body.service_type)?;

  // Held until the rewrite lands so concurrent updates cannot interleave.
  let _guard = state.writes.lock().await;

  let mut dataset = load(&state).await?;
  if dataset.get(&tag).is_none() {
    return Err(Error::NotFound(format!("equipment not found: {tag}")));
  }
  check_if_match(&headers, &compute_etag(&dataset))?;

  dataset.update(&tag, RecordUpdate {
    serviced_date:   Some(body.serviced_date),
    interval_days:   Some(body.interval_days),
    kit_part_number: body.kit_part_number,
    serial_number:   body.serial_number,
  })?;
  dataset.append_history(NewHistoryEntry {
    tag:           tag.clone(),
    serviced_date: body.serviced_date,
    interval_days: body.interval_days,
    service_type:  service_type.clone(),
  });
  state.store.persist(&dataset).await.map_err(Error::store)?;

  tracing::info!(
    user = %session.username,
    %tag,
    serviced = %body.serviced_date,
    interval = body.interval_days,
    service_type = %service_type,
    "service logged"
  );

  let now    = Local::now().naive_local();
  let detail = EquipmentDetail::build(&dataset, &tag, now)?;
  Ok(([(header::ETAG, compute_etag(&dataset))], Json(detail)).into_response())
}
