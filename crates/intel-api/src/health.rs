//! `/health/db` and the JSON 404 fallback.

use axum::{extract::State, http::Uri};
use intel_core::{source::DataSource, store::IntelStore};
use serde::Serialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct DbHealth {
  pub success: bool,
  pub source:  DataSource,
}

/// `GET /health/db`
///
/// Reports the data source this process resolved at startup.
pub async fn db<S>(State(state): State<AppState<S>>) -> axum::Json<DbHealth>
where
  S: IntelStore,
{
  axum::Json(DbHealth { success: true, source: state.source })
}

pub async fn not_found(uri: Uri) -> ApiError {
  ApiError::NotFound(format!("no route for {}", uri.path()))
}
