//! Handlers for `/contacts/bulk`.
//!
//! Each item is processed on its own: a failing item is reported in
//! `errors` and never rolls back the items that succeeded.
//!
//! | Method   | Body |
//! |----------|------|
//! | `POST`   | `{"contacts":[...]}` |
//! | `PUT`    | `{"contactIds":[...],"updates":{...}}` |
//! | `DELETE` | `{"contactIds":[...],"reason":"..."}` |

use axum::extract::State;
use intel_core::{
  DomainError,
  bulk::BulkOutcome,
  contact::{ContactPatch, ContactView, NewContact},
  store::IntelStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  AppState,
  auth::MaybeSession,
  error::ApiError,
  extract::{Body, Data},
};

/// Upper bound on items in one request.
pub const MAX_BULK_ITEMS: usize = 500;

fn check_size(len: usize, field: &str) -> Result<(), ApiError> {
  if len == 0 {
    return Err(ApiError::BadRequest(format!("{field} must not be empty")));
  }
  if len > MAX_BULK_ITEMS {
    return Err(ApiError::BadRequest(format!(
      "{field} may hold at most {MAX_BULK_ITEMS} items"
    )));
  }
  Ok(())
}

/// The per-item message for a failed store call. Unclassified failures are
/// logged and reported generically, as for whole requests.
fn item_error<E>(e: E) -> String
where
  E: std::error::Error + DomainError + Send + Sync + 'static,
{
  let err = ApiError::store(e);
  if let ApiError::Internal(inner) = &err {
    tracing::error!(error = %inner, "bulk item failed");
  }
  err.public_message()
}

type Outcome = axum::Json<Data<BulkOutcome<ContactView>>>;

// ─── Create ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateManyBody {
  pub contacts: Vec<Value>,
}

/// `POST /contacts/bulk`
pub async fn create_many<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Body(body): Body<CreateManyBody>,
) -> Result<Outcome, ApiError>
where
  S: IntelStore,
{
  check_size(body.contacts.len(), "contacts")?;

  let mut outcome = BulkOutcome::new(body.contacts.len());
  for (index, raw) in body.contacts.into_iter().enumerate() {
    let input = match serde_json::from_value::<NewContact>(raw) {
      Ok(input) => input,
      Err(e) => {
        outcome.fail(index, None, format!("invalid contact: {e}"));
        continue;
      }
    };
    match state.store.create_contact(input, session.actor()).await {
      Ok(contact) => outcome.succeed(contact),
      Err(e) => outcome.fail(index, None, item_error(e)),
    }
  }

  tracing::info!(
    total = outcome.summary.total,
    failed = outcome.summary.failed,
    "bulk create"
  );
  Ok(Data::new(outcome))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateManyBody {
  pub contact_ids: Vec<i64>,
  pub updates:     ContactPatch,
}

/// `PUT /contacts/bulk`: one patch applied to every listed contact.
pub async fn update_many<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Body(body): Body<UpdateManyBody>,
) -> Result<Outcome, ApiError>
where
  S: IntelStore,
{
  check_size(body.contact_ids.len(), "contactIds")?;
  // A patch that cannot apply to anything fails the whole request.
  let patch = body.updates.validate()?;

  let mut outcome = BulkOutcome::new(body.contact_ids.len());
  for (index, id) in body.contact_ids.into_iter().enumerate() {
    match state.store.update_contact(id, patch.clone(), session.actor()).await {
      Ok(contact) => outcome.succeed(contact),
      Err(e) => outcome.fail(index, Some(id), item_error(e)),
    }
  }

  tracing::info!(
    total = outcome.summary.total,
    failed = outcome.summary.failed,
    "bulk update"
  );
  Ok(Data::new(outcome))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyBody {
  pub contact_ids: Vec<i64>,
  #[serde(default)]
  pub reason:      Option<String>,
}

/// `DELETE /contacts/bulk`, soft deletes.
pub async fn delete_many<S>(
  State(state): State<AppState<S>>,
  session: MaybeSession,
  Body(body): Body<DeleteManyBody>,
) -> Result<Outcome, ApiError>
where
  S: IntelStore,
{
  check_size(body.contact_ids.len(), "contactIds")?;

  let mut outcome = BulkOutcome::new(body.contact_ids.len());
  for (index, id) in body.contact_ids.into_iter().enumerate() {
    match state
      .store
      .deactivate_contact(id, body.reason.clone(), session.actor())
      .await
    {
      Ok(contact) => outcome.succeed(contact),
      Err(e) => outcome.fail(index, Some(id), item_error(e)),
    }
  }

  tracing::info!(
    total = outcome.summary.total,
    failed = outcome.summary.failed,
    "bulk delete"
  );
  Ok(Data::new(outcome))
}
