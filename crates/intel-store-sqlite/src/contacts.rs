//! Contact queries and mutations, run inside `tokio_rusqlite` closures.
//!
//! Every mutation opens a transaction and appends its history row before
//! committing, so a change is never visible without its audit entry.

use std::collections::HashMap;

use intel_core::{
  activity::HistoryAction,
  contact::{AssigneeSummary, ContactPatch, DEFAULT_INACTIVE_REASON, NewContact},
  location::{Location, STRUCTURED_COUNTRY},
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};

use crate::{
  encode::{
    CONTACT_SELECT, FIRST_ASSIGNMENT_CTE, LocationColumns, RawAssignment, RawContact, RawHistory,
    RawOutreach, RawRelationship, UpdateSet, read_assignment, read_contact, read_history,
    read_outreach, read_relationship,
  },
  error::{CallResult, abort},
};

/// A contact row plus every assignee, in assignment order.
pub(crate) type Loaded = (RawContact, Vec<AssigneeSummary>);

/// Bound filter values for a listing; `None` disables a predicate.
pub(crate) struct ListFilter {
  pub pattern:   Option<String>,
  pub priority:  Option<String>,
  pub is_active: Option<bool>,
  pub limit:     i64,
  pub offset:    i64,
}

const LIST_WHERE: &str = "
WHERE (?1 IS NULL OR c.first_name LIKE ?1 ESCAPE '\\')
  AND (?2 IS NULL OR c.priority = ?2)
  AND (?3 IS NULL OR c.is_active = ?3)";

// ─── Reads ───────────────────────────────────────────────────────────────────

pub(crate) fn exists(conn: &Connection, id: i64) -> CallResult<bool> {
  Ok(
    conn
      .query_row("SELECT 1 FROM contacts WHERE id = ?1", [id], |_| Ok(()))
      .optional()?
      .is_some(),
  )
}

pub(crate) fn require(conn: &Connection, id: i64) -> CallResult<()> {
  if exists(conn, id)? {
    Ok(())
  } else {
    Err(abort(intel_core::Error::ContactNotFound(id)))
  }
}

pub(crate) fn fetch(conn: &Connection, id: i64) -> CallResult<Option<Loaded>> {
  let sql = format!("{FIRST_ASSIGNMENT_CTE}{CONTACT_SELECT} WHERE c.id = ?1");
  let Some(raw) = conn.query_row(&sql, [id], read_contact).optional()? else {
    return Ok(None);
  };
  let mut assignees = assignees_for(conn, &[id])?;
  Ok(Some((raw, assignees.remove(&id).unwrap_or_default())))
}

fn fetch_required(conn: &Connection, id: i64) -> CallResult<Loaded> {
  fetch(conn, id)?.ok_or_else(|| abort(intel_core::Error::ContactNotFound(id)))
}

/// Every assignee of the given contacts, grouped by contact.
fn assignees_for(conn: &Connection, ids: &[i64]) -> CallResult<HashMap<i64, Vec<AssigneeSummary>>> {
  let mut grouped: HashMap<i64, Vec<AssigneeSummary>> = HashMap::new();
  if ids.is_empty() {
    return Ok(grouped);
  }
  let id_list = format!(
    "[{}]",
    ids.iter().map(i64::to_string).collect::<Vec<_>>().join(",")
  );

  let mut stmt = conn.prepare(
    "SELECT ca.contact_id, ca.user_id, u.name, u.last_name
     FROM contact_assignments ca
     JOIN users u ON u.id = ca.user_id
     WHERE ca.contact_id IN (SELECT value FROM json_each(?1))
     ORDER BY ca.contact_id, ca.id",
  )?;
  let rows = stmt.query_map([id_list], |row| {
    Ok((row.get::<_, i64>(0)?, AssigneeSummary {
      user_id:   row.get(1)?,
      name:      row.get(2)?,
      last_name: row.get(3)?,
    }))
  })?;
  for row in rows {
    let (contact_id, assignee) = row?;
    grouped.entry(contact_id).or_default().push(assignee);
  }
  Ok(grouped)
}

/// Total matching rows and one page of them, read in a single transaction
/// so the count and the page agree.
pub(crate) fn list(conn: &mut Connection, filter: ListFilter) -> CallResult<(u64, Vec<Loaded>)> {
  let tx = conn.transaction()?;

  let total: i64 = tx.query_row(
    &format!("SELECT COUNT(*) FROM contacts c {LIST_WHERE}"),
    params![filter.pattern, filter.priority, filter.is_active],
    |r| r.get(0),
  )?;

  let sql = format!(
    "{FIRST_ASSIGNMENT_CTE}{CONTACT_SELECT}{LIST_WHERE}
     ORDER BY c.created_at DESC, c.id DESC
     LIMIT ?4 OFFSET ?5"
  );
  let raws = {
    let mut stmt = tx.prepare(&sql)?;
    stmt
      .query_map(
        params![
          filter.pattern,
          filter.priority,
          filter.is_active,
          filter.limit,
          filter.offset
        ],
        read_contact,
      )?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };

  let ids: Vec<i64> = raws.iter().map(|r| r.id).collect();
  let mut assignees = assignees_for(&tx, &ids)?;
  tx.commit()?;

  let rows = raws
    .into_iter()
    .map(|raw| {
      let all = assignees.remove(&raw.id).unwrap_or_default();
      (raw, all)
    })
    .collect();
  Ok((u64::try_from(total).unwrap_or_default(), rows))
}

// ─── Validation ──────────────────────────────────────────────────────────────

/// A structured location must name a known US state, and its city (if any)
/// must belong to that state.
pub(crate) fn check_location(conn: &Connection, location: &Location) -> CallResult<()> {
  let Location::Structured { state_code, city_id } = location else {
    return Ok(());
  };
  if let Some(state) = state_code {
    check_state(conn, STRUCTURED_COUNTRY, state)?;
  }
  if let (Some(city_id), Some(state)) = (city_id, state_code) {
    check_city(conn, *city_id, state)?;
  }
  Ok(())
}

pub(crate) fn check_state(conn: &Connection, country_code: &str, state_code: &str) -> CallResult<()> {
  let known = conn
    .query_row(
      "SELECT 1 FROM states WHERE code = ?1 AND country_code = ?2",
      params![state_code, country_code],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if known {
    Ok(())
  } else {
    Err(abort(intel_core::Error::Invalid(format!(
      "unknown state {state_code:?} for country {country_code:?}"
    ))))
  }
}

pub(crate) fn check_city(conn: &Connection, city_id: i64, state_code: &str) -> CallResult<()> {
  let city_state: Option<String> = conn
    .query_row("SELECT state_code FROM cities WHERE id = ?1", [city_id], |r| r.get(0))
    .optional()?;
  match city_state {
    None => Err(abort(intel_core::Error::CityNotFound(city_id))),
    Some(s) if s != state_code => Err(abort(intel_core::Error::Invalid(format!(
      "city {city_id} is not in state {state_code:?}"
    )))),
    Some(_) => Ok(()),
  }
}

pub(crate) fn check_company(conn: &Connection, company_id: Option<i64>) -> CallResult<()> {
  let Some(id) = company_id else { return Ok(()) };
  let known = conn
    .query_row("SELECT 1 FROM companies WHERE id = ?1", [id], |_| Ok(()))
    .optional()?
    .is_some();
  if known {
    Ok(())
  } else {
    Err(abort(intel_core::Error::CompanyNotFound(id)))
  }
}

fn check_user(conn: &Connection, user_id: i64) -> CallResult<()> {
  let known = conn
    .query_row("SELECT 1 FROM users WHERE id = ?1", [user_id], |_| Ok(()))
    .optional()?
    .is_some();
  if known {
    Ok(())
  } else {
    Err(abort(intel_core::Error::UserNotFound(user_id)))
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

/// An append-only history row, written by the caller's transaction.
pub(crate) struct HistoryRow<'a> {
  pub action:  HistoryAction,
  pub changes: Option<&'a str>,
  pub reason:  Option<&'a str>,
  pub actor:   Option<i64>,
  pub at:      &'a str,
}

fn append_history(conn: &Connection, contact_id: i64, row: HistoryRow<'_>) -> CallResult<()> {
  conn.execute(
    "INSERT INTO contact_history (contact_id, action, changes, reason, user_id, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    params![contact_id, row.action.as_ref(), row.changes, row.reason, row.actor, row.at],
  )?;
  Ok(())
}

pub(crate) fn history(conn: &Connection, contact_id: i64) -> CallResult<Vec<RawHistory>> {
  require(conn, contact_id)?;
  let mut stmt = conn.prepare(
    "SELECT id, contact_id, action, changes, reason, user_id, created_at
     FROM contact_history
     WHERE contact_id = ?1
     ORDER BY created_at DESC, id DESC",
  )?;
  let rows = stmt
    .query_map([contact_id], read_history)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Mutations ───────────────────────────────────────────────────────────────

/// Insert a validated contact. `changes` is the JSON recorded in history.
pub(crate) fn insert(
  conn: &mut Connection,
  input: NewContact,
  location: Option<Location>,
  changes: &str,
  actor: Option<i64>,
  now: &str,
) -> CallResult<Loaded> {
  let tx = conn.transaction()?;
  if let Some(loc) = &location {
    check_location(&tx, loc)?;
  }
  check_company(&tx, input.company_id)?;

  let loc = LocationColumns::from(location);
  tx.execute(
    "INSERT INTO contacts (
       first_name, last_name, email, email_secondary,
       linkedin_url, facebook_url, instagram_url, imdb_url, wikipedia_url,
       biography, priority, seen_film, doc_branch_member,
       country_code, state_code, city_id,
       location_country, location_state, location_city,
       is_active, company_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
               ?14, ?15, ?16, ?17, ?18, ?19, 1, ?20, ?21, ?21)",
    params![
      input.first_name,
      input.last_name,
      input.email,
      input.email_secondary,
      input.linkedin_url,
      input.facebook_url,
      input.instagram_url,
      input.imdb_url,
      input.wikipedia_url,
      input.biography,
      input.priority.as_ref(),
      input.seen_film,
      input.doc_branch_member,
      loc.country_code,
      loc.state_code,
      loc.city_id,
      loc.country,
      loc.state,
      loc.city,
      input.company_id,
      now,
    ],
  )?;
  let id = tx.last_insert_rowid();

  append_history(&tx, id, HistoryRow {
    action: HistoryAction::Created,
    changes: Some(changes),
    reason: None,
    actor,
    at: now,
  })?;

  let loaded = fetch_required(&tx, id)?;
  tx.commit()?;
  Ok(loaded)
}

/// Apply a validated sparse patch. `location` is the patch's location key,
/// already normalised.
pub(crate) fn update(
  conn: &mut Connection,
  id: i64,
  patch: ContactPatch,
  location: Option<Option<Location>>,
  changes: &str,
  actor: Option<i64>,
  now: &str,
) -> CallResult<Loaded> {
  let tx = conn.transaction()?;
  require(&tx, id)?;

  let mut set = UpdateSet::default();
  if let Some(v) = patch.first_name {
    set.set("first_name", v);
  }
  if let Some(v) = patch.last_name {
    set.set("last_name", v);
  }
  if let Some(v) = patch.email {
    set.set("email", v);
  }
  if let Some(v) = patch.email_secondary {
    set.set("email_secondary", v);
  }
  if let Some(v) = patch.linkedin_url {
    set.set("linkedin_url", v);
  }
  if let Some(v) = patch.facebook_url {
    set.set("facebook_url", v);
  }
  if let Some(v) = patch.instagram_url {
    set.set("instagram_url", v);
  }
  if let Some(v) = patch.imdb_url {
    set.set("imdb_url", v);
  }
  if let Some(v) = patch.wikipedia_url {
    set.set("wikipedia_url", v);
  }
  if let Some(v) = patch.biography {
    set.set("biography", v);
  }
  if let Some(v) = patch.priority {
    set.set("priority", v.as_ref().to_owned());
  }
  if let Some(v) = patch.seen_film {
    set.set("seen_film", v);
  }
  if let Some(v) = patch.doc_branch_member {
    set.set("doc_branch_member", v);
  }
  if let Some(location) = location {
    if let Some(loc) = &location {
      check_location(&tx, loc)?;
    }
    let cols = LocationColumns::from(location);
    set.set("country_code", cols.country_code);
    set.set("state_code", cols.state_code);
    set.set("city_id", cols.city_id);
    set.set("location_country", cols.country);
    set.set("location_state", cols.state);
    set.set("location_city", cols.city);
  }
  if let Some(company_id) = patch.company_id {
    check_company(&tx, company_id)?;
    set.set("company_id", company_id);
  }
  match patch.is_active {
    Some(true) => {
      set.set("is_active", true);
      set.set("inactive_reason", None::<String>);
      set.set("inactive_at", None::<String>);
    }
    Some(false) => {
      set.set("is_active", false);
      set.set("inactive_reason", DEFAULT_INACTIVE_REASON.to_owned());
      set.set("inactive_at", now.to_owned());
    }
    None => {}
  }
  set.set("updated_at", now.to_owned());

  let (sql, values) = set.into_statement("contacts", id);
  tx.execute(&sql, params_from_iter(values))?;

  append_history(&tx, id, HistoryRow {
    action: HistoryAction::Updated,
    changes: Some(changes),
    reason: None,
    actor,
    at: now,
  })?;

  let loaded = fetch_required(&tx, id)?;
  tx.commit()?;
  Ok(loaded)
}

/// Soft delete. The row stays; only the status columns change.
pub(crate) fn deactivate(
  conn: &mut Connection,
  id: i64,
  reason: &str,
  actor: Option<i64>,
  now: &str,
) -> CallResult<Loaded> {
  let tx = conn.transaction()?;
  require(&tx, id)?;

  tx.execute(
    "UPDATE contacts
     SET is_active = 0, inactive_reason = ?1, inactive_at = ?2, updated_at = ?2
     WHERE id = ?3",
    params![reason, now, id],
  )?;
  append_history(&tx, id, HistoryRow {
    action: HistoryAction::Deactivated,
    changes: None,
    reason: Some(reason),
    actor,
    at: now,
  })?;

  let loaded = fetch_required(&tx, id)?;
  tx.commit()?;
  Ok(loaded)
}

// ─── Assignments ─────────────────────────────────────────────────────────────

pub(crate) fn assign(conn: &mut Connection, contact_id: i64, user_id: i64, now: &str) -> CallResult<bool> {
  let tx = conn.transaction()?;
  require(&tx, contact_id)?;
  check_user(&tx, user_id)?;
  let inserted = tx.execute(
    "INSERT OR IGNORE INTO contact_assignments (contact_id, user_id, assigned_at)
     VALUES (?1, ?2, ?3)",
    params![contact_id, user_id, now],
  )?;
  tx.commit()?;
  Ok(inserted > 0)
}

pub(crate) fn unassign(conn: &mut Connection, contact_id: i64, user_id: i64) -> CallResult<bool> {
  let tx = conn.transaction()?;
  require(&tx, contact_id)?;
  let removed = tx.execute(
    "DELETE FROM contact_assignments WHERE contact_id = ?1 AND user_id = ?2",
    params![contact_id, user_id],
  )?;
  tx.commit()?;
  Ok(removed > 0)
}

pub(crate) fn assignments(conn: &Connection, contact_id: i64) -> CallResult<Vec<RawAssignment>> {
  require(conn, contact_id)?;
  let mut stmt = conn.prepare(
    "SELECT ca.id, ca.contact_id, ca.user_id, u.name, u.last_name, ca.assigned_at
     FROM contact_assignments ca
     JOIN users u ON u.id = ca.user_id
     WHERE ca.contact_id = ?1
     ORDER BY ca.id",
  )?;
  let rows = stmt
    .query_map([contact_id], read_assignment)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Outreach & relationships ────────────────────────────────────────────────

pub(crate) fn outreach(conn: &Connection, contact_id: i64) -> CallResult<Vec<RawOutreach>> {
  require(conn, contact_id)?;
  let mut stmt = conn.prepare(
    "SELECT id, contact_id, event_type, channel, description, user_id, occurred_at
     FROM outreach_events
     WHERE contact_id = ?1
     ORDER BY occurred_at DESC, id DESC",
  )?;
  let rows = stmt
    .query_map([contact_id], read_outreach)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub(crate) fn relationships(conn: &Connection, contact_id: i64) -> CallResult<Vec<RawRelationship>> {
  require(conn, contact_id)?;
  let mut stmt = conn.prepare(
    "SELECT r.id, r.contact_id, r.related_contact_id,
            o.first_name || ' ' || o.last_name, r.relationship_type, r.created_at
     FROM contact_relationships r
     JOIN contacts o ON o.id = r.related_contact_id
     WHERE r.contact_id = ?1
     ORDER BY r.id",
  )?;
  let rows = stmt
    .query_map([contact_id], read_relationship)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}
