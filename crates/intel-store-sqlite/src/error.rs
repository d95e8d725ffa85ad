//! Error type for `intel-store-sqlite`.

use intel_core::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0}")]
  Core(#[from] intel_core::Error),

  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored enum tag that no longer parses.
  #[error("decode error: {0}")]
  Decode(String),
}

/// Domain failures raised inside a `call` closure travel out as
/// `tokio_rusqlite::Error::Other`; unwrap them back into [`Error::Core`].
impl From<tokio_rusqlite::Error> for Error {
  fn from(e: tokio_rusqlite::Error) -> Self {
    match e {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<intel_core::Error>() {
        Ok(core) => Error::Core(*core),
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      },
      other => Error::Database(other),
    }
  }
}

impl DomainError for Error {
  fn domain(&self) -> Option<&intel_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

/// Abort the current `call` closure (rolling back any open transaction) with
/// a domain error.
pub(crate) fn abort(e: intel_core::Error) -> tokio_rusqlite::Error {
  tokio_rusqlite::Error::Other(Box::new(e))
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// What a `tokio_rusqlite` closure returns.
pub(crate) type CallResult<T> = std::result::Result<T, tokio_rusqlite::Error>;
