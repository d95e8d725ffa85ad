//! Session authentication: password hashing, bearer tokens, the session
//! extractors, and the `/auth` handlers.
//!
//! Tokens are 32 random bytes, hex encoded, handed to the client once. Only
//! their SHA-256 digest is stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  extract::{FromRequestParts, State},
  http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Utc};
use intel_core::{
  store::IntelStore,
  user::{NewSession, User},
};
use rand_core::{OsRng, RngCore as _};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::{
  AppState,
  error::ApiError,
  extract::{Body, Data, Done},
};

// ─── Passwords & tokens ──────────────────────────────────────────────────────

/// Produce an argon2 PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
  PasswordHash::new(hash)
    .and_then(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed))
    .is_ok()
}

pub fn new_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

pub fn token_digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Option<Result<&str, ApiError>> {
  let value = headers.get(header::AUTHORIZATION)?;
  Some(
    value
      .to_str()
      .ok()
      .and_then(|v| v.strip_prefix("Bearer "))
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .ok_or(ApiError::Unauthorized),
  )
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// An authenticated request: the acting user, resolved from the bearer token
/// on the server side.
#[derive(Debug, Clone)]
pub struct Session {
  pub user:       User,
  pub token_hash: String,
}

async fn resolve<S>(token: &str, state: &AppState<S>) -> Result<Session, ApiError>
where
  S: IntelStore,
{
  let token_hash = token_digest(token);
  let user = state
    .store
    .session_user(token_hash.clone(), Utc::now())
    .await
    .map_err(ApiError::store)?
    .ok_or(ApiError::Unauthorized)?;
  if !user.role.can_sign_in() {
    return Err(ApiError::Unauthorized);
  }
  Ok(Session { user, token_hash })
}

impl<S> FromRequestParts<AppState<S>> for Session
where
  S: IntelStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)??;
    resolve(token, state).await
  }
}

/// A session if the request carries one. A token that is present but not
/// valid is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl MaybeSession {
  pub fn actor(&self) -> Option<i64> { self.0.as_ref().map(|s| s.user.id) }
}

impl<S> FromRequestParts<AppState<S>> for MaybeSession
where
  S: IntelStore + Clone + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    match bearer_token(&parts.headers) {
      None => Ok(Self(None)),
      Some(token) => Ok(Self(Some(resolve(token?, state).await?))),
    }
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

/// `POST /auth/login`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Body(body): Body<LoginBody>,
) -> Result<axum::Json<Data<LoginResponse>>, ApiError>
where
  S: IntelStore,
{
  let rejected = || ApiError::Unauthorized;

  let credentials = state
    .store
    .credentials(body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(rejected)?;
  let hash = credentials.password_hash.as_deref().ok_or_else(rejected)?;
  if !verify_password(&body.password, hash) || !credentials.user.role.can_sign_in() {
    return Err(rejected());
  }

  let token = new_token();
  let created_at = Utc::now();
  let expires_at = created_at + state.session_ttl;
  state
    .store
    .create_session(NewSession {
      token_hash: token_digest(&token),
      user_id: credentials.user.id,
      created_at,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = credentials.user.id, "session issued");
  Ok(Data::new(LoginResponse { token, expires_at, user: credentials.user }))
}

/// `POST /auth/logout`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  session: Session,
) -> Result<axum::Json<Done>, ApiError>
where
  S: IntelStore,
{
  state
    .store
    .delete_session(session.token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(Done::new("Logged out"))
}

/// `GET /auth/me`
pub async fn me(session: Session) -> axum::Json<Data<User>> { Data::new(session.user) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn password_round_trip() {
    let hash = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &hash));
    assert!(!verify_password("hunter3", &hash));
    assert!(!verify_password("hunter2", "not-a-phc-string"));
  }

  #[test]
  fn tokens_are_random_hex() {
    let a = new_token();
    assert_eq!(a.len(), 64);
    assert_ne!(a, new_token());
    assert_eq!(token_digest(&a).len(), 64);
    assert_ne!(token_digest(&a), a);
  }

  #[test]
  fn bearer_parsing() {
    let mut headers = HeaderMap::new();
    assert!(bearer_token(&headers).is_none());

    headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
    assert!(matches!(bearer_token(&headers), Some(Err(ApiError::Unauthorized))));

    headers.insert(header::AUTHORIZATION, "Bearer tok".parse().unwrap());
    assert!(matches!(bearer_token(&headers), Some(Ok("tok"))));
  }
}
