//! Error types for `intel-core`.
//!
//! These are the domain failures every backend reports in the same way. The
//! API layer maps each [`ErrorKind`] to an HTTP status.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("contact not found: {0}")]
  ContactNotFound(i64),

  #[error("company not found: {0}")]
  CompanyNotFound(i64),

  #[error("note not found: {0}")]
  NoteNotFound(i64),

  #[error("user not found: {0}")]
  UserNotFound(i64),

  #[error("city not found: {0}")]
  CityNotFound(i64),

  #[error("a company named {0:?} already exists")]
  DuplicateCompanyName(String),

  #[error("a user with email {0:?} already exists")]
  DuplicateEmail(String),

  #[error("company {company_id} is referenced by {contacts} contact(s)")]
  CompanyHasContacts { company_id: i64, contacts: i64 },

  #[error("{0}")]
  Invalid(String),

  #[error("{0}")]
  Forbidden(String),

  #[error("authentication required")]
  Unauthenticated,

  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

/// Coarse classification of an [`Error`], one bucket per response class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  NotFound,
  Conflict,
  Invalid,
  Forbidden,
  Unauthenticated,
  Internal,
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::ContactNotFound(_)
      | Self::CompanyNotFound(_)
      | Self::NoteNotFound(_)
      | Self::UserNotFound(_) => ErrorKind::NotFound,
      Self::DuplicateCompanyName(_)
      | Self::DuplicateEmail(_)
      | Self::CompanyHasContacts { .. } => ErrorKind::Conflict,
      // A dangling city reference is bad input, not a missing resource.
      Self::CityNotFound(_) | Self::Invalid(_) => ErrorKind::Invalid,
      Self::Forbidden(_) => ErrorKind::Forbidden,
      Self::Unauthenticated => ErrorKind::Unauthenticated,
      Self::Configuration(_) | Self::Serialization(_) => ErrorKind::Internal,
    }
  }
}

/// Implemented by backend error types so callers can recover the domain
/// failure (if any) without knowing the concrete backend.
pub trait DomainError {
  fn domain(&self) -> Option<&Error>;
}

impl DomainError for Error {
  fn domain(&self) -> Option<&Error> { Some(self) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
