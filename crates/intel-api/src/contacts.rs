//! Handlers for `/contacts` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/contacts` | `?page&limit&search&priority&status` |
//! | `POST`   | `/contacts` | Body: a new contact; returns 201 |
//! | `GET`    | `/contacts/{id}` | Company, location names and assignees joined in |
//! | `PUT`    | `/contacts/{id}` | Sparse update; absent keys are untouched |
//! | `DELETE` | `/contacts/{id}` | Soft delete, optional `?reason=` |
//! | `GET`    | `/contacts/{id}/history` | Newest first |
//! | `GET`    | `/contacts/{id}/outreach` | Newest first |
//! | `GET`    | `/contacts/{id}/relationships` | |
//! | `GET`    | `/contacts/{id}/assignments` | Assignment order |
//! | `POST`   | `/contacts/{id}/assignments` | Body: `{"userId":1}`; session required |
//! | `DELETE` | `/contacts/{id}/assignments/{userId}` | Session required |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use intel_core::{
  activity::{Assignment, HistoryEntry, OutreachEvent, Relationship},
  contact::{ContactPatch, ContactView, NewContact},
  query::{ContactQuery, Pagination, PriorityFilter, StatusFilter, search_term},
  store::IntelStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{MaybeSession, Session},
  error::ApiError,
  extract::{Body, Data, Done, Listing, Path, Query},
};

// ─── List ────────────────────────────────────────────────────────────────────

/// Raw query-string values; parsed leniently so a garbage `page` or `limit`
/// falls back to the default.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:     Option<String>,
  pub limit:    Option<String>,
  pub search:   Option<String>,
  pub priority: Option<String>,
  pub status:   Option<String>,
}

impl ListParams {
  pub fn into_query(self) -> Result<ContactQuery, ApiError> {
    Ok(ContactQuery {
      pagination: Pagination::from_raw(self.page.as_deref(), self.limit.as_deref()),
      search:     search_term(self.search.as_deref()),
      priority:   PriorityFilter::parse(self.priority.as_deref())?,
      status:     StatusFilter::parse(self.status.as_deref())?,
    })
  }
}

/// `GET /contacts`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  let query = params.into_query()?;
  let page = state
    .store
    .list_contacts(&query)
    .await
    .map_err(ApiError::store)?;
  Ok(Listing::new(page))
}

// ─── Single contact ──────────────────────────────────────────────────────────

/// `POST /contacts`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Body(body): Body<NewContact>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  let contact = state
    .store
    .create_contact(body, session.actor())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Data::new(contact)))
}

pub(crate) async fn load<S>(state: &AppState<S>, id: i64) -> Result<ContactView, ApiError>
where
  S: IntelStore,
{
  state
    .store
    .get_contact(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("contact not found: {id}")))
}

/// `GET /contacts/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<ContactView>>, ApiError>
where
  S: IntelStore,
{
  Ok(Data::new(load(&state, id).await?))
}

/// `PUT /contacts/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Path(id): Path<i64>,
  Body(patch): Body<ContactPatch>,
) -> Result<axum::Json<Data<ContactView>>, ApiError>
where
  S: IntelStore,
{
  let contact = state
    .store
    .update_contact(id, patch, session.actor())
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(contact))
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteParams {
  pub reason: Option<String>,
}

/// `DELETE /contacts/{id}`: the row stays, marked inactive.
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Path(id): Path<i64>,
  Query(params): Query<DeleteParams>,
) -> Result<axum::Json<Data<ContactView>>, ApiError>
where
  S: IntelStore,
{
  let contact = state
    .store
    .deactivate_contact(id, params.reason, session.actor())
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(contact))
}

// ─── Related records ─────────────────────────────────────────────────────────

/// `GET /contacts/{id}/history`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<Vec<HistoryEntry>>>, ApiError>
where
  S: IntelStore,
{
  let entries = state
    .store
    .contact_history(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(entries))
}

/// `GET /contacts/{id}/outreach`
pub async fn outreach<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<Vec<OutreachEvent>>>, ApiError>
where
  S: IntelStore,
{
  let events = state.store.list_outreach(id).await.map_err(ApiError::store)?;
  Ok(Data::new(events))
}

/// `GET /contacts/{id}/relationships`
pub async fn relationships<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<Vec<Relationship>>>, ApiError>
where
  S: IntelStore,
{
  let related = state
    .store
    .list_relationships(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(related))
}

// ─── Assignments ─────────────────────────────────────────────────────────────

/// `GET /contacts/{id}/assignments`
pub async fn assignments<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<axum::Json<Data<Vec<Assignment>>>, ApiError>
where
  S: IntelStore,
{
  let rows = state
    .store
    .list_assignments(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(rows))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignBody {
  pub user_id: i64,
}

/// `POST /contacts/{id}/assignments`. Re-assigning the same user is a no-op.
pub async fn assign<S>(
  State(state): State<AppState<S>>,
  _session: Session,
  Path(id): Path<i64>,
  Body(body): Body<AssignBody>,
) -> Result<axum::Json<Data<Vec<Assignment>>>, ApiError>
where
  S: IntelStore,
{
  state
    .store
    .assign_contact(id, body.user_id)
    .await
    .map_err(ApiError::store)?;
  let rows = state
    .store
    .list_assignments(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(rows))
}

/// `DELETE /contacts/{id}/assignments/{userId}`
pub async fn unassign<S>(
  State(state): State<AppState<S>>,
  _session: Session,
  Path((id, user_id)): Path<(i64, i64)>,
) -> Result<axum::Json<Done>, ApiError>
where
  S: IntelStore,
{
  let removed = state
    .store
    .unassign_contact(id, user_id)
    .await
    .map_err(ApiError::store)?;
  if !removed {
    return Err(ApiError::NotFound(format!(
      "user {user_id} is not assigned to contact {id}"
    )));
  }
  Ok(Done::new("Assignment removed"))
}
