//! HTTP Basic-auth extractor and the argon2 credential table.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use upkeep_core::{
  access::{CredentialVerifier, Role, Session},
  store::RecordStore,
};

use crate::{AccountConfig, AppState, error::Error};

// ─── Credential table ────────────────────────────────────────────────────────

/// Accounts accepted by this server instance, checked against argon2 PHC
/// strings (`$argon2id$v=19$…`).
#[derive(Clone, Default)]
pub struct CredentialTable {
  accounts: Vec<AccountConfig>,
}

impl CredentialTable {
  /// Build the table, rejecting any account whose hash is not a PHC string.
  pub fn new(accounts: Vec<AccountConfig>) -> Result<Self, argon2::password_hash::Error> {
    for account in &accounts {
      PasswordHash::new(&account.password_hash)?;
    }
    Ok(Self { accounts })
  }

  pub fn len(&self) -> usize { self.accounts.len() }

  pub fn is_empty(&self) -> bool { self.accounts.is_empty() }
}

impl CredentialVerifier for CredentialTable {
  fn verify(&self, username: &str, password: &str) -> Option<Role> {
    let username = username.trim();
    let account = self.accounts.iter().find(|a| a.username == username)?;
    let parsed = PasswordHash::new(&account.password_hash).ok()?;
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .ok()?;
    Some(account.role)
  }
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated identity behind one request.
pub struct Authenticated(pub Session);

/// Resolve the `Authorization` header into a [`Session`].
pub fn verify_auth(
  headers: &HeaderMap,
  verifier: &dyn CredentialVerifier,
) -> Result<Session, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::Unauthorized)?;

  let decoded = B64.decode(encoded.trim()).map_err(|_| Error::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(Error::Unauthorized)?;

  match verifier.verify(username, password) {
    Some(role) => Ok(Session { username: username.trim().to_owned(), role }),
    None => {
      tracing::debug!(username, "credentials rejected");
      Err(Error::Unauthorized)
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for Authenticated
where
  S: RecordStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = verify_auth(&parts.headers, state.credentials.as_ref())?;
    Ok(Authenticated(session))
  }
}

/// An authenticated caller allowed to modify records. Runs before any body
/// extractor, so a read-only caller is refused without the body being read.
pub struct Supervisor(pub Session);

impl<S> FromRequestParts<AppState<S>> for Supervisor
where
  S: RecordStore + Clone + 'static,
{
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let session = verify_auth(&parts.headers, state.credentials.as_ref())?;
    if !session.can_edit() {
      tracing::warn!(
        user = %session.username,
        role = %session.role,
        path = %parts.uri.path(),
        "write denied"
      );
      return Err(Error::Forbidden(session.role.to_string()));
    }
    Ok(Supervisor(session))
  }
}
