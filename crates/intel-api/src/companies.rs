//! Handlers for `/companies` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/companies` | `?page&limit&search`; alphabetical |
//! | `POST`   | `/companies` | Names are unique, case-insensitively |
//! | `GET`    | `/companies/{id}` | |
//! | `PUT`    | `/companies/{id}` | Sparse update |
//! | `DELETE` | `/companies/{id}` | 409 while any contact references it |
//!
//! Mutations take an optional session; a bearer token that does not resolve
//! is still a 401.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use intel_core::{
  company::{CompanyPatch, CompanyView, NewCompany},
  query::{CompanyQuery, Pagination, search_term},
  store::IntelStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::MaybeSession,
  error::ApiError,
  extract::{Body, Data, Done, Listing, Path, Query},
};

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:   Option<String>,
  pub limit:  Option<String>,
  pub search: Option<String>,
}

impl ListParams {
  pub fn into_query(self) -> CompanyQuery {
    CompanyQuery {
      pagination: Pagination::from_raw(self.page.as_deref(), self.limit.as_deref()),
      search:     search_term(self.search.as_deref()),
    }
  }
}

/// `GET /companies`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  let query = params.into_query();
  let page = state
    .store
    .list_companies(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Listing::new(page))
}

/// `POST /companies`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Body(body): Body<NewCompany>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  let company = state
    .store
    .create_company(body)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(company_id = company.company.id, actor = ?session.actor(), "company created");
  Ok((StatusCode::CREATED, Data::new(company)))
}

/// `GET /companies/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<CompanyView>>, ApiError>
where
  S: IntelStore,
{
  let company = state
    .store
    .get_company(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("company not found: {id}")))?;
  Ok(Data::new(company))
}

/// `PUT /companies/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Path(id): Path<i64>,
  Body(patch): Body<CompanyPatch>,
) -> Result<axum::Json<Data<CompanyView>>, ApiError>
where
  S: IntelStore,
{
  let company = state
    .store
    .update_company(id, patch)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(company_id = id, actor = ?session.actor(), "company updated");
  Ok(Data::new(company))
}

/// `DELETE /companies/{id}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Path(id): Path<i64>,
) -> Result<axum::Json<Done>, ApiError>
where
  S: IntelStore,
{
  state
    .store
    .delete_company(id)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(company_id = id, actor = ?session.actor(), "company deleted");
  Ok(Done::new("Company deleted"))
}
