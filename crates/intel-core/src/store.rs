//! The `IntelStore` trait.
//!
//! Implemented by storage backends (e.g. `intel-store-sqlite`). The API layer
//! depends on this abstraction, not on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  DomainError,
  activity::{Assignment, HistoryEntry, OutreachEvent, Relationship},
  company::{CompanyPatch, CompanyView, NewCompany},
  contact::{ContactPatch, ContactView, NewContact},
  location::{City, CityQuery, Country, NewCity, State},
  note::{NewNote, Note, NotePatch},
  query::{CompanyQuery, ContactQuery, Page},
  user::{Credentials, NewSession, NewUser, User},
};

/// Abstraction over a People Intel backend.
///
/// Every contact mutation writes its history row atomically with the change
/// itself. Domain failures (not found, conflicts, permission) surface through
/// [`DomainError::domain`] on the backend's error type.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait IntelStore: Send + Sync {
  type Error: std::error::Error + DomainError + Send + Sync + 'static;

  // ── Reference data ────────────────────────────────────────────────────

  fn add_country(
    &self,
    country: Country,
  ) -> impl Future<Output = Result<Country, Self::Error>> + Send + '_;

  fn list_countries(&self) -> impl Future<Output = Result<Vec<Country>, Self::Error>> + Send + '_;

  fn add_state(&self, state: State) -> impl Future<Output = Result<State, Self::Error>> + Send + '_;

  /// States of one country, alphabetically.
  fn list_states(
    &self,
    country_code: String,
  ) -> impl Future<Output = Result<Vec<State>, Self::Error>> + Send + '_;

  fn add_city(&self, city: NewCity) -> impl Future<Output = Result<City, Self::Error>> + Send + '_;

  /// Cities of one state whose folded name starts with `query.prefix`.
  fn search_cities(
    &self,
    query: CityQuery,
  ) -> impl Future<Output = Result<Vec<City>, Self::Error>> + Send + '_;

  /// Exact lookup on the `(city_ascii, state_code)` matching key.
  fn find_city(
    &self,
    city_ascii: String,
    state_code: String,
  ) -> impl Future<Output = Result<Option<City>, Self::Error>> + Send + '_;

  // ── Users & sessions ──────────────────────────────────────────────────

  fn create_user(&self, user: NewUser) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(&self, id: i64) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(&self) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Look a user up by email for sign-in.
  fn credentials(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + '_;

  fn create_session(
    &self,
    session: NewSession,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user owning an unexpired session, or `None`.
  fn session_user(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Returns `true` if a session was removed.
  fn delete_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  /// Insert a contact and its `created` history row.
  fn create_contact(
    &self,
    input: NewContact,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  /// Fetch one contact, active or not.
  fn get_contact(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<ContactView>, Self::Error>> + Send + '_;

  /// One page of contacts plus the total count of the filtered set.
  fn list_contacts<'a>(
    &'a self,
    query: &'a ContactQuery,
  ) -> impl Future<Output = Result<Page<ContactView>, Self::Error>> + Send + 'a;

  /// Apply a sparse update and append an `updated` history row whose
  /// payload is the patch as submitted.
  fn update_contact(
    &self,
    id: i64,
    patch: ContactPatch,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  /// Soft delete: mark inactive with a reason and timestamp, append a
  /// `deactivated` history row. The row itself is kept.
  fn deactivate_contact(
    &self,
    id: i64,
    reason: Option<String>,
    actor: Option<i64>,
  ) -> impl Future<Output = Result<ContactView, Self::Error>> + Send + '_;

  /// History rows for a contact, newest first.
  fn contact_history(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<HistoryEntry>, Self::Error>> + Send + '_;

  /// Returns `false` if the user was already assigned.
  fn assign_contact(
    &self,
    contact_id: i64,
    user_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Returns `false` if there was no such assignment.
  fn unassign_contact(
    &self,
    contact_id: i64,
    user_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Assignments in assignment order.
  fn list_assignments(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<Assignment>, Self::Error>> + Send + '_;

  fn list_outreach(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<OutreachEvent>, Self::Error>> + Send + '_;

  fn list_relationships(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  // ── Companies ─────────────────────────────────────────────────────────

  fn create_company(
    &self,
    input: NewCompany,
  ) -> impl Future<Output = Result<CompanyView, Self::Error>> + Send + '_;

  fn get_company(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<CompanyView>, Self::Error>> + Send + '_;

  fn list_companies<'a>(
    &'a self,
    query: &'a CompanyQuery,
  ) -> impl Future<Output = Result<Page<CompanyView>, Self::Error>> + Send + 'a;

  fn update_company(
    &self,
    id: i64,
    patch: CompanyPatch,
  ) -> impl Future<Output = Result<CompanyView, Self::Error>> + Send + '_;

  /// Hard delete, refused while any contact references the company.
  fn delete_company(&self, id: i64) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Notes ─────────────────────────────────────────────────────────────

  /// Notes on a contact, newest first.
  fn list_notes(
    &self,
    contact_id: i64,
  ) -> impl Future<Output = Result<Vec<Note>, Self::Error>> + Send + '_;

  /// Requires `author.role` to be editor or admin.
  fn create_note(
    &self,
    contact_id: i64,
    author: User,
    input: NewNote,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + '_;

  /// Requires `actor` to be the note's author or an admin.
  fn update_note(
    &self,
    contact_id: i64,
    note_id: i64,
    actor: User,
    patch: NotePatch,
  ) -> impl Future<Output = Result<Note, Self::Error>> + Send + '_;

  /// Requires `actor` to be the note's author or an admin.
  fn delete_note(
    &self,
    contact_id: i64,
    note_id: i64,
    actor: User,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
