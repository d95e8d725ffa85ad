//! Internal users and their sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Admin,
  Editor,
  #[default]
  Viewer,
  External,
  Suspended,
}

impl Role {
  pub fn is_admin(self) -> bool { matches!(self, Self::Admin) }

  /// Only editors and admins may write notes.
  pub fn can_create_notes(self) -> bool { matches!(self, Self::Editor | Self::Admin) }

  pub fn can_sign_in(self) -> bool { !matches!(self, Self::Suspended) }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         i64,
  pub name:       String,
  pub last_name:  Option<String>,
  pub email:      String,
  pub role:       Role,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::IntelStore::create_user`]. The password, if any,
/// arrives already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:          String,
  pub last_name:     Option<String>,
  pub email:         String,
  pub role:          Role,
  pub password_hash: Option<String>,
}

impl NewUser {
  pub fn validate(mut self) -> Result<Self> {
    self.name = self.name.trim().to_owned();
    self.email = self.email.trim().to_lowercase();
    if self.name.is_empty() {
      return Err(Error::Invalid("name is required".into()));
    }
    if !self.email.contains('@') {
      return Err(Error::Invalid("email is not a valid email address".into()));
    }
    Ok(self)
  }
}

/// A user together with their stored password hash, for sign-in only.
#[derive(Debug, Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: Option<String>,
}

/// A server-issued session. Only the SHA-256 digest of the bearer token is
/// ever persisted.
#[derive(Debug, Clone)]
pub struct NewSession {
  pub token_hash: String,
  pub user_id:    i64,
  pub created_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn note_writers() {
    assert!(Role::Admin.can_create_notes());
    assert!(Role::Editor.can_create_notes());
    assert!(!Role::Viewer.can_create_notes());
    assert!(!Role::External.can_create_notes());
    assert!(!Role::Suspended.can_create_notes());
  }

  #[test]
  fn emails_are_normalised() {
    let u = NewUser {
      name:          " Ada ".into(),
      last_name:     None,
      email:         " Ada@Example.COM ".into(),
      role:          Role::Editor,
      password_hash: None,
    }
    .validate()
    .unwrap();
    assert_eq!(u.name, "Ada");
    assert_eq!(u.email, "ada@example.com");
  }
}
