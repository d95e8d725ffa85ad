//! Handlers for `/contacts/{id}/notes`.
//!
//! Listing is open. Writing needs a session: creating requires the editor or
//! admin role, and editing or deleting requires being the author or an
//! admin. The acting user always comes from the session, never the body.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use intel_core::{
  note::{NewNote, Note, NotePatch},
  store::IntelStore,
};

use crate::{
  AppState,
  auth::Session,
  error::ApiError,
  extract::{Body, Data, Done, Path},
};

/// `GET /contacts/{id}/notes`, newest first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Path(contact_id): Path<i64>,
) -> Result<axum::Json<Data<Vec<Note>>>, ApiError>
where
  S: IntelStore,
{
  let notes = state
    .store
    .list_notes(contact_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(notes))
}

/// `POST /contacts/{id}/notes`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Path(contact_id): Path<i64>,
  Body(body): Body<NewNote>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  let note = state
    .store
    .create_note(contact_id, session.user, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Data::new(note)))
}

/// `PUT /contacts/{id}/notes/{noteId}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Path((contact_id, note_id)): Path<(i64, i64)>,
  Body(patch): Body<NotePatch>,
) -> Result<axum::Json<Data<Note>>, ApiError>
where
  S: IntelStore,
{
  let note = state
    .store
    .update_note(contact_id, note_id, session.user, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(note))
}

/// `DELETE /contacts/{id}/notes/{noteId}`
pub async fn delete<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Path((contact_id, note_id)): Path<(i64, i64)>,
) -> Result<axum::Json<Done>, ApiError>
where
  S: IntelStore,
{
  state
    .store
    .delete_note(contact_id, note_id, session.user)
    .await
    .map_err(ApiError::store)?;
  Ok(Done::new("Note deleted"))
}
