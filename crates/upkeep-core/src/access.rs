//! Roles and credential verification.
//!
//! Two fixed roles exist: a Supervisor may edit records and log services, a
//! Technician may only read, search, and filter.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
  #[serde(alias = "supervisor")]
  Supervisor,
  #[serde(alias = "technician")]
  Technician,
}

impl Role {
  pub fn can_edit(self) -> bool { matches!(self, Self::Supervisor) }
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Supervisor => "Supervisor",
      Self::Technician => "Technician",
    })
  }
}

/// Checks a username/password pair. Implementations may be a static table, a
/// database, or an external identity provider.
pub trait CredentialVerifier: Send + Sync {
  /// The role granted to these credentials, or `None` if access is denied.
  fn verify(&self, username: &str, password: &str) -> Option<Role>;
}

/// The identity behind a single request. Built fresh for every request; no
/// session state outlives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
  pub username: String,
  pub role:     Role,
}

impl Session {
  pub fn can_edit(&self) -> bool { self.role.can_edit() }
}
