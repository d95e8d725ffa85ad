//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure body has the shape `{"success": false, "error": "..."}`.
//! Unclassified errors are logged in full and reported to the client as a
//! generic message.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use intel_core::{DomainError, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store error by the domain failure it carries, if any.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + DomainError + Send + Sync + 'static,
  {
    let Some(kind) = e.domain().map(intel_core::Error::kind) else {
      return Self::Internal(Box::new(e));
    };
    let message = e.to_string();
    match kind {
      ErrorKind::Invalid => Self::BadRequest(message),
      ErrorKind::NotFound => Self::NotFound(message),
      ErrorKind::Conflict => Self::Conflict(message),
      ErrorKind::Forbidden => Self::Forbidden(message),
      ErrorKind::Unauthenticated => Self::Unauthorized,
      ErrorKind::Internal => Self::Internal(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::Conflict(_) => StatusCode::CONFLICT,
      Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  /// The message a client may see.
  pub fn public_message(&self) -> String {
    match self {
      Self::Internal(_) => "Internal server error".to_owned(),
      other => other.to_string(),
    }
  }
}

impl From<intel_core::Error> for ApiError {
  fn from(e: intel_core::Error) -> Self { Self::store(e) }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    if let Self::Internal(e) = &self {
      tracing::error!(error = %e, source = ?e, "request failed");
    }
    let status = self.status();
    let body = Json(json!({ "success": false, "error": self.public_message() }));
    (status, body).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn domain_errors_map_to_statuses() {
    let cases = [
      (intel_core::Error::ContactNotFound(1), StatusCode::NOT_FOUND),
      (intel_core::Error::DuplicateCompanyName("x".into()), StatusCode::CONFLICT),
      (
        intel_core::Error::CompanyHasContacts { company_id: 1, contacts: 2 },
        StatusCode::CONFLICT,
      ),
      (intel_core::Error::Invalid("bad".into()), StatusCode::BAD_REQUEST),
      (intel_core::Error::CityNotFound(3), StatusCode::BAD_REQUEST),
      (intel_core::Error::Forbidden("no".into()), StatusCode::FORBIDDEN),
      (intel_core::Error::Unauthenticated, StatusCode::UNAUTHORIZED),
      (intel_core::Error::Configuration("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }

  #[test]
  fn internal_details_stay_private() {
    let err = ApiError::from(intel_core::Error::Configuration("secret path".into()));
    assert_eq!(err.public_message(), "Internal server error");
  }
}
