//! JSON REST API for People Intel.
//!
//! Exposes an axum [`Router`] backed by any [`IntelStore`]. TLS and process
//! concerns belong to the `intel-server` binary.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", intel_api::router(state))
//! ```

pub mod auth;
pub mod bulk;
pub mod companies;
pub mod contacts;
pub mod error;
pub mod extract;
pub mod health;
pub mod locations;
pub mod notes;
pub mod users;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post, put},
};
use intel_core::{source::DataSource, store::IntelStore};
use intel_store_sqlite::DatabaseConfig;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `INTEL_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:              String,
  #[serde(default = "default_port")]
  pub port:              u16,
  #[serde(default)]
  pub db_source:         DataSource,
  #[serde(default = "default_sqlite_path")]
  pub sqlite_path:       PathBuf,
  /// When set, opened at startup and handed to the resolver as the live
  /// remote binding.
  #[serde(default)]
  pub remote_db_path:    Option<PathBuf>,
  #[serde(default = "default_session_ttl_hours")]
  pub session_ttl_hours: i64,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8787 }

fn default_sqlite_path() -> PathBuf { PathBuf::from(intel_store_sqlite::connection::DEFAULT_SQLITE_PATH) }

fn default_session_ttl_hours() -> i64 { 24 }

impl ServerConfig {
  pub fn database(&self) -> DatabaseConfig {
    DatabaseConfig { source: self.db_source, sqlite_path: self.sqlite_path.clone() }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: IntelStore> {
  pub store:       Arc<S>,
  /// The resolved source, reported by `/health/db`.
  pub source:      DataSource,
  pub session_ttl: chrono::Duration,
}

impl<S: IntelStore> AppState<S> {
  pub fn new(store: S, source: DataSource) -> Self {
    Self {
      store: Arc::new(store),
      source,
      session_ttl: chrono::Duration::hours(default_session_ttl_hours()),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: IntelStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Auth
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/me", get(auth::me))
    // Contacts
    .route("/contacts", get(contacts::list::<S>).post(contacts::create::<S>))
    .route(
      "/contacts/bulk",
      post(bulk::create_many::<S>)
        .put(bulk::update_many::<S>)
        .delete(bulk::delete_many::<S>),
    )
    .route(
      "/contacts/{id}",
      get(contacts::get_one::<S>)
        .put(contacts::update::<S>)
        .delete(contacts::delete::<S>),
    )
    .route("/contacts/{id}/history", get(contacts::history::<S>))
    .route("/contacts/{id}/outreach", get(contacts::outreach::<S>))
    .route("/contacts/{id}/relationships", get(contacts::relationships::<S>))
    .route(
      "/contacts/{id}/assignments",
      get(contacts::assignments::<S>).post(contacts::assign::<S>),
    )
    .route(
      "/contacts/{id}/assignments/{user_id}",
      axum::routing::delete(contacts::unassign::<S>),
    )
    // Notes
    .route("/contacts/{id}/notes", get(notes::list::<S>).post(notes::create::<S>))
    .route(
      "/contacts/{id}/notes/{note_id}",
      put(notes::update::<S>).delete(notes::delete::<S>),
    )
    // Companies
    .route("/companies", get(companies::list::<S>).post(companies::create::<S>))
    .route(
      "/companies/{id}",
      get(companies::get_one::<S>)
        .put(companies::update::<S>)
        .delete(companies::delete::<S>),
    )
    // Reference data
    .route("/locations/countries", get(locations::countries::<S>))
    .route("/locations/states", get(locations::states::<S>))
    .route("/locations/cities", get(locations::cities::<S>))
    .route("/locations/cities/lookup", get(locations::lookup_city::<S>))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    // Health
    .route("/health/db", get(health::db::<S>))
    .fallback(health::not_found)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
