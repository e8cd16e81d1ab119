//! `GET /api/session`: who the caller is and what they may do.

use axum::Json;
use serde::Serialize;
use upkeep_core::access::Role;

use crate::auth::Authenticated;

#[derive(Debug, Serialize)]
pub struct SessionInfo {
  pub username: String,
  pub role:     Role,
  pub can_edit: bool,
}

pub async fn handler(Authenticated(session): Authenticated) -> Json<SessionInfo> {
  Json(SessionInfo {
    can_edit: session.can_edit(),
    username: session.username,
    role:     session.role,
  })
}
