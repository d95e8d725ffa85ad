//! Handlers for `/users`.
//!
//! Listing needs any session; creating a user needs an admin session.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use intel_core::{
  store::IntelStore,
  user::{NewUser, Role, User},
};
use serde::Deserialize;

use crate::{
  AppState,
  auth::{Session, hash_password},
  error::ApiError,
  extract::{Body, Data},
};

/// `GET /users`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _session: Session,
) -> Result<axum::Json<Data<Vec<User>>>, ApiError>
where
  S: IntelStore,
{
  let users = state.store.list_users().await.map_err(ApiError::store)?;
  Ok(Data::new(users))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
  pub name:      String,
  #[serde(default)]
  pub last_name: Option<String>,
  pub email:     String,
  #[serde(default)]
  pub role:      Role,
  /// Users created without a password cannot sign in.
  #[serde(default)]
  pub password:  Option<String>,
}

/// `POST /users`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Body(body): Body<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: IntelStore,
{
  if !session.user.role.is_admin() {
    return Err(ApiError::Forbidden("only admins may create users".into()));
  }

  let password_hash = match body.password.as_deref() {
    Some("") => return Err(ApiError::BadRequest("password must not be empty".into())),
    Some(password) => Some(
      hash_password(password).map_err(|e| ApiError::Internal(e.to_string().into()))?,
    ),
    None => None,
  };

  let user = state
    .store
    .create_user(NewUser {
      name: body.name,
      last_name: body.last_name,
      email: body.email,
      role: body.role,
      password_hash,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = user.id, created_by = session.user.id, "user created");
  Ok((StatusCode::CREATED, Data::new(user)))
}
