//! Request extractors whose rejections use the API's JSON error shape, and
//! the success envelopes.

use axum::extract::{FromRequest, FromRequestParts};
use intel_core::query::Page;
use serde::Serialize;

use crate::error::ApiError;

/// JSON request body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Body<T>(pub T);

/// Path parameters; a malformed id is a 400.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct Path<T>(pub T);

/// Query-string parameters.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct Query<T>(pub T);

// ─── Envelopes ───────────────────────────────────────────────────────────────

/// `{"success": true, "data": ...}`
#[derive(Debug, Serialize)]
pub struct Data<T> {
  pub success: bool,
  pub data:    T,
}

impl<T> Data<T> {
  pub fn new(data: T) -> axum::Json<Self> { axum::Json(Self { success: true, data }) }
}

/// `{"success": true, "data": [...], "pagination": {...}}`
#[derive(Debug, Serialize)]
pub struct Listing<T> {
  pub success: bool,
  #[serde(flatten)]
  pub page:    Page<T>,
}

impl<T> Listing<T> {
  pub fn new(page: Page<T>) -> axum::Json<Self> { axum::Json(Self { success: true, page }) }
}

/// `{"success": true, "message": ...}` for operations with nothing to return.
#[derive(Debug, Serialize)]
pub struct Done {
  pub success: bool,
  pub message: String,
}

impl Done {
  pub fn new(message: impl Into<String>) -> axum::Json<Self> {
    axum::Json(Self { success: true, message: message.into() })
  }
}
