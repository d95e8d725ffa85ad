//! [`SqliteStore`], the SQLite implementation of [`IntelStore`].

use std::path::Path;

use chrono::{DateTime, Utc};

use intel_core::{
  activity::{Assignment, HistoryEntry, OutreachEvent, Relationship},
  company::{CompanyPatch, CompanyView, NewCompany},
  contact::{ContactPatch, ContactView, DEFAULT_INACTIVE_REASON, NewContact},
  location::{City, CityQuery, Country, NewCity, State},
  note::{NewNote, Note, NotePatch},
  query::{CompanyQuery, ContactQuery, Page, PageInfo, Pagination},
  store::IntelStore,
  user::{Credentials, NewSession, NewUser, User},
};

use crate::{
  Error, Result, companies, contacts,
  contacts::Loaded,
  encode::{contains_pattern, encode_dt},
  notes, reference,
  schema::{PRAGMAS, SCHEMA},
  users,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A People Intel store backed by one SQLite database.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run on the connection's dedicated thread, one closure at a
/// time, so writers never interleave.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and apply the schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests and mock mode.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.migrate().await?;
    Ok(store)
  }

  /// Wrap a connection opened elsewhere. Only per-connection pragmas are
  /// applied; the schema is the owner's responsibility (`intel-admin migrate`).
  pub async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Apply the schema. Idempotent.
  pub async fn migrate(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Close the connection, waiting for pending statements to finish.
  pub async fn close(self) -> Result<()> {
    self.conn.close().await?;
    Ok(())
  }

  /// Write a consistent snapshot of the whole database to `path`, which must
  /// not exist yet.
  pub async fn backup_to(&self, path: impl AsRef<Path>) -> Result<()> {
    let target = path.as_ref().to_string_lossy().into_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute("VACUUM INTO ?1", [target])?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

fn decode_loaded((raw, all): Loaded) -> Result<ContactView> { raw.into_view(all) }

fn page_of<T>(pagination: Pagination, total: u64, data: Vec<T>) -> Page<T> {
  Page { data, pagination: PageInfo::new(pagination, total) }
}

fn bounds(pagination: Pagination) -> (i64, i64) {
  (
    i64::from(pagination.limit),
    i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
  )
}

// ─── IntelStore impl ─────────────────────────────────────────────────────────

impl IntelStore for SqliteStore {
  type Error = Error;

  // ── Reference data ────────────────────────────────────────────────────────

  async fn add_country(&self, country: Country) -> Result<Country> {
    let country = Country {
      code: country.code.trim().to_uppercase(),
      name: country.name.trim().to_owned(),
    };
    let stored = country.clone();
    self
      .conn
      .call(move |conn| reference::upsert_country(conn, &stored))
      .await?;
    Ok(country)
  }

  async fn list_countries(&self) -> Result<Vec<Country>> {
    Ok(self.conn.call(|conn| reference::countries(conn)).await?)
  }

  async fn add_state(&self, state: State) -> Result<State> {
    let state = State {
      code:         state.code.trim().to_uppercase(),
      name:         state.name.trim().to_owned(),
      country_code: state.country_code.trim().to_uppercase(),
    };
    let stored = state.clone();
    self
      .conn
      .call(move |conn| reference::upsert_state(conn, &stored))
      .await?;
    Ok(state)
  }

  async fn list_states(&self, country_code: String) -> Result<Vec<State>> {
    let code = country_code.trim().to_uppercase();
    Ok(self.conn.call(move |conn| reference::states(conn, &code)).await?)
  }

  async fn add_city(&self, city: NewCity) -> Result<City> {
    let city_ascii = city.matching_name();
    let city = NewCity {
      city: city.city.trim().to_owned(),
      state_code: city.state_code.trim().to_uppercase(),
      ..city
    };
    if city.city.is_empty() || city.state_code.is_empty() {
      return Err(intel_core::Error::Invalid("city and stateCode are required".into()).into());
    }
    Ok(
      self
        .conn
        .call(move |conn| reference::insert_city(conn, &city, &city_ascii))
        .await?,
    )
  }

  async fn search_cities(&self, query: CityQuery) -> Result<Vec<City>> {
    Ok(self.conn.call(move |conn| reference::search_cities(conn, &query)).await?)
  }

  async fn find_city(&self, city_ascii: String, state_code: String) -> Result<Option<City>> {
    Ok(
      self
        .conn
        .call(move |conn| reference::find_city(conn, &city_ascii, &state_code))
        .await?,
    )
  }

  // ── Users & sessions ──────────────────────────────────────────────────────

  async fn create_user(&self, user: NewUser) -> Result<User> {
    let user = user.validate()?;
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| users::insert(conn, user, &now))
      .await?;
    raw.into_user()
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw = self.conn.call(move |conn| users::fetch(conn, id)).await?;
    raw.map(|r| r.into_user()).transpose()
  }

  async fn list_users(&self) -> Result<Vec<User>> {
    let raws = self.conn.call(|conn| users::list(conn)).await?;
    raws.into_iter().map(|r| r.into_user()).collect()
  }

  async fn credentials(&self, email: String) -> Result<Option<Credentials>> {
    let email = email.trim().to_owned();
    let found = self
      .conn
      .call(move |conn| users::credentials(conn, &email))
      .await?;
    found
      .map(|(raw, password_hash)| Ok(Credentials { user: raw.into_user()?, password_hash }))
      .transpose()
  }

  async fn create_session(&self, session: NewSession) -> Result<()> {
    let created = encode_dt(session.created_at);
    let expires = encode_dt(session.expires_at);
    self
      .conn
      .call(move |conn| users::insert_session(conn, &session, &created, &expires))
      .await?;
    Ok(())
  }

  async fn session_user(&self, token_hash: String, now: DateTime<Utc>) -> Result<Option<User>> {
    let now = encode_dt(now);
    let raw = self
      .conn
      .call(move |conn| users::session_user(conn, &token_hash, &now))
      .await?;
    raw.map(|r| r.into_user()).transpose()
  }

  async fn delete_session(&self, token_hash: String) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| users::delete_session(conn, &token_hash))
        .await?,
    )
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn create_contact(&self, input: NewContact, actor: Option<i64>) -> Result<ContactView> {
    let mut input = input.validate()?;
    let changes = serde_json::to_string(&input)?;
    let location = input.location.take().map(|l| l.normalize()).transpose()?.flatten();
    let now = encode_dt(Utc::now());

    let loaded = self
      .conn
      .call(move |conn| contacts::insert(conn, input, location, &changes, actor, &now))
      .await?;
    decode_loaded(loaded)
  }

  async fn get_contact(&self, id: i64) -> Result<Option<ContactView>> {
    let loaded = self.conn.call(move |conn| contacts::fetch(conn, id)).await?;
    loaded.map(decode_loaded).transpose()
  }

  async fn list_contacts<'a>(&'a self, query: &'a ContactQuery) -> Result<Page<ContactView>> {
    let (limit, offset) = bounds(query.pagination);
    let filter = contacts::ListFilter {
      pattern: query.search.as_deref().map(contains_pattern),
      priority: query.priority.priority().map(|p| p.as_ref().to_owned()),
      is_active: query.status.is_active(),
      limit,
      offset,
    };

    let (total, rows) = self.conn.call(move |conn| contacts::list(conn, filter)).await?;
    let data = rows
      .into_iter()
      .map(decode_loaded)
      .collect::<Result<Vec<_>>>()?;
    Ok(page_of(query.pagination, total, data))
  }

  async fn update_contact(
    &self,
    id: i64,
    patch: ContactPatch,
    actor: Option<i64>,
  ) -> Result<ContactView> {
    let patch = patch.validate()?;
    // History records the patch exactly as submitted.
    let changes = serde_json::to_string(&patch)?;
    let location = patch
      .location
      .clone()
      .map(|l| l.map(|l| l.normalize()).transpose().map(Option::flatten))
      .transpose()?;
    let now = encode_dt(Utc::now());

    let loaded = self
      .conn
      .call(move |conn| contacts::update(conn, id, patch, location, &changes, actor, &now))
      .await?;
    decode_loaded(loaded)
  }

  async fn deactivate_contact(
    &self,
    id: i64,
    reason: Option<String>,
    actor: Option<i64>,
  ) -> Result<ContactView> {
    let reason = reason
      .map(|r| r.trim().to_owned())
      .filter(|r| !r.is_empty())
      .unwrap_or_else(|| DEFAULT_INACTIVE_REASON.to_owned());
    let now = encode_dt(Utc::now());

    let loaded = self
      .conn
      .call(move |conn| contacts::deactivate(conn, id, &reason, actor, &now))
      .await?;
    decode_loaded(loaded)
  }

  async fn contact_history(&self, contact_id: i64) -> Result<Vec<HistoryEntry>> {
    let raws = self
      .conn
      .call(move |conn| contacts::history(conn, contact_id))
      .await?;
    raws.into_iter().map(|r| r.into_entry()).collect()
  }

  async fn assign_contact(&self, contact_id: i64, user_id: i64) -> Result<bool> {
    let now = encode_dt(Utc::now());
    Ok(
      self
        .conn
        .call(move |conn| contacts::assign(conn, contact_id, user_id, &now))
        .await?,
    )
  }

  async fn unassign_contact(&self, contact_id: i64, user_id: i64) -> Result<bool> {
    Ok(
      self
        .conn
        .call(move |conn| contacts::unassign(conn, contact_id, user_id))
        .await?,
    )
  }

  async fn list_assignments(&self, contact_id: i64) -> Result<Vec<Assignment>> {
    let raws = self
      .conn
      .call(move |conn| contacts::assignments(conn, contact_id))
      .await?;
    raws.into_iter().map(|r| r.into_assignment()).collect()
  }

  async fn list_outreach(&self, contact_id: i64) -> Result<Vec<OutreachEvent>> {
    let raws = self
      .conn
      .call(move |conn| contacts::outreach(conn, contact_id))
      .await?;
    raws.into_iter().map(|r| r.into_event()).collect()
  }

  async fn list_relationships(&self, contact_id: i64) -> Result<Vec<Relationship>> {
    let raws = self
      .conn
      .call(move |conn| contacts::relationships(conn, contact_id))
      .await?;
    raws.into_iter().map(|r| r.into_relationship()).collect()
  }

  // ── Companies ─────────────────────────────────────────────────────────────

  async fn create_company(&self, input: NewCompany) -> Result<CompanyView> {
    let input = input.validate()?;
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| companies::insert(conn, input, &now))
      .await?;
    raw.into_view()
  }

  async fn get_company(&self, id: i64) -> Result<Option<CompanyView>> {
    let raw = self.conn.call(move |conn| companies::fetch(conn, id)).await?;
    raw.map(|r| r.into_view()).transpose()
  }

  async fn list_companies<'a>(&'a self, query: &'a CompanyQuery) -> Result<Page<CompanyView>> {
    let (limit, offset) = bounds(query.pagination);
    let filter = companies::ListFilter {
      pattern: query.search.as_deref().map(contains_pattern),
      limit,
      offset,
    };

    let (total, rows) = self.conn.call(move |conn| companies::list(conn, filter)).await?;
    let data = rows
      .into_iter()
      .map(|r| r.into_view())
      .collect::<Result<Vec<_>>>()?;
    Ok(page_of(query.pagination, total, data))
  }

  async fn update_company(&self, id: i64, patch: CompanyPatch) -> Result<CompanyView> {
    let patch = patch.validate()?;
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| companies::update(conn, id, patch, &now))
      .await?;
    raw.into_view()
  }

  async fn delete_company(&self, id: i64) -> Result<()> {
    self.conn.call(move |conn| companies::delete(conn, id)).await?;
    Ok(())
  }

  // ── Notes ─────────────────────────────────────────────────────────────────

  async fn list_notes(&self, contact_id: i64) -> Result<Vec<Note>> {
    let raws = self
      .conn
      .call(move |conn| notes::list(conn, contact_id))
      .await?;
    raws.into_iter().map(|r| r.into_note()).collect()
  }

  async fn create_note(&self, contact_id: i64, author: User, input: NewNote) -> Result<Note> {
    if !author.role.can_create_notes() {
      return Err(
        intel_core::Error::Forbidden("only editors and admins may create notes".into()).into(),
      );
    }
    let input = input.validate()?;
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| notes::insert(conn, contact_id, author.id, input, &now))
      .await?;
    raw.into_note()
  }

  async fn update_note(
    &self,
    contact_id: i64,
    note_id: i64,
    actor: User,
    patch: NotePatch,
  ) -> Result<Note> {
    let patch = patch.validate()?;
    let now = encode_dt(Utc::now());
    let raw = self
      .conn
      .call(move |conn| notes::update(conn, contact_id, note_id, &actor, patch, &now))
      .await?;
    raw.into_note()
  }

  async fn delete_note(&self, contact_id: i64, note_id: i64, actor: User) -> Result<()> {
    self
      .conn
      .call(move |conn| notes::delete(conn, contact_id, note_id, &actor))
      .await?;
    Ok(())
  }
}
