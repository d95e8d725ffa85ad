//! Company queries and mutations.

use intel_core::company::{CompanyPatch, NewCompany};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter};

use crate::{
  contacts::{check_city, check_state},
  encode::{COMPANY_SELECT, RawCompany, UpdateSet, read_company},
  error::{CallResult, abort},
};

pub(crate) struct ListFilter {
  pub pattern: Option<String>,
  pub limit:   i64,
  pub offset:  i64,
}

const LIST_WHERE: &str = " WHERE (?1 IS NULL OR co.name LIKE ?1 ESCAPE '\\')";

pub(crate) fn fetch(conn: &Connection, id: i64) -> CallResult<Option<RawCompany>> {
  let sql = format!("{COMPANY_SELECT} WHERE co.id = ?1");
  Ok(conn.query_row(&sql, [id], read_company).optional()?)
}

fn fetch_required(conn: &Connection, id: i64) -> CallResult<RawCompany> {
  fetch(conn, id)?.ok_or_else(|| abort(intel_core::Error::CompanyNotFound(id)))
}

pub(crate) fn list(conn: &mut Connection, filter: ListFilter) -> CallResult<(u64, Vec<RawCompany>)> {
  let tx = conn.transaction()?;
  let total: i64 = tx.query_row(
    &format!("SELECT COUNT(*) FROM companies co{LIST_WHERE}"),
    params![filter.pattern],
    |r| r.get(0),
  )?;
  let sql = format!(
    "{COMPANY_SELECT}{LIST_WHERE}
     ORDER BY co.name COLLATE NOCASE, co.id
     LIMIT ?2 OFFSET ?3"
  );
  let rows = {
    let mut stmt = tx.prepare(&sql)?;
    stmt
      .query_map(params![filter.pattern, filter.limit, filter.offset], read_company)?
      .collect::<rusqlite::Result<Vec<_>>>()?
  };
  tx.commit()?;
  Ok((u64::try_from(total).unwrap_or_default(), rows))
}

/// Names compare case-insensitively after trimming.
fn check_unique_name(conn: &Connection, name: &str, except: Option<i64>) -> CallResult<()> {
  let taken = conn
    .query_row(
      "SELECT 1 FROM companies
       WHERE name = ?1 COLLATE NOCASE AND (?2 IS NULL OR id != ?2)",
      params![name, except],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if taken {
    Err(abort(intel_core::Error::DuplicateCompanyName(name.to_owned())))
  } else {
    Ok(())
  }
}

/// Validates the headquarters columns as stored after a write.
fn check_headquarters(conn: &Connection, id: i64) -> CallResult<()> {
  let (country, state, city): (Option<String>, Option<String>, Option<i64>) = conn.query_row(
    "SELECT country_code, state_code, city_id FROM companies WHERE id = ?1",
    [id],
    |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
  )?;
  match (country, state, city) {
    (_, None, Some(_)) => Err(abort(intel_core::Error::Invalid(
      "stateCode is required when cityId is given".into(),
    ))),
    (None, Some(_), _) => Err(abort(intel_core::Error::Invalid(
      "countryCode is required when stateCode is given".into(),
    ))),
    (Some(country), Some(state), city) => {
      check_state(conn, &country, &state)?;
      if let Some(city) = city {
        check_city(conn, city, &state)?;
      }
      Ok(())
    }
    _ => Ok(()),
  }
}

pub(crate) fn insert(conn: &mut Connection, input: NewCompany, now: &str) -> CallResult<RawCompany> {
  let tx = conn.transaction()?;
  check_unique_name(&tx, &input.name, None)?;
  tx.execute(
    "INSERT INTO companies (
       name, website, linkedin_url, industry, size, description, logo_url,
       country_code, state_code, city_id, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
    params![
      input.name,
      input.website,
      input.linkedin_url,
      input.industry,
      input.size,
      input.description,
      input.logo_url,
      input.country_code,
      input.state_code,
      input.city_id,
      now,
    ],
  )?;
  let id = tx.last_insert_rowid();
  check_headquarters(&tx, id)?;
  let raw = fetch_required(&tx, id)?;
  tx.commit()?;
  Ok(raw)
}

pub(crate) fn update(
  conn: &mut Connection,
  id: i64,
  patch: CompanyPatch,
  now: &str,
) -> CallResult<RawCompany> {
  let tx = conn.transaction()?;
  fetch_required(&tx, id)?;

  let mut set = UpdateSet::default();
  if let Some(name) = patch.name {
    check_unique_name(&tx, &name, Some(id))?;
    set.set("name", name);
  }
  if let Some(v) = patch.website {
    set.set("website", v);
  }
  if let Some(v) = patch.linkedin_url {
    set.set("linkedin_url", v);
  }
  if let Some(v) = patch.industry {
    set.set("industry", v);
  }
  if let Some(v) = patch.size {
    set.set("size", v);
  }
  if let Some(v) = patch.description {
    set.set("description", v);
  }
  if let Some(v) = patch.logo_url {
    set.set("logo_url", v);
  }
  if let Some(v) = patch.country_code {
    set.set("country_code", v);
  }
  if let Some(v) = patch.state_code {
    set.set("state_code", v);
  }
  if let Some(v) = patch.city_id {
    set.set("city_id", v);
  }
  set.set("updated_at", now.to_owned());

  let (sql, values) = set.into_statement("companies", id);
  tx.execute(&sql, params_from_iter(values))?;
  check_headquarters(&tx, id)?;

  let raw = fetch_required(&tx, id)?;
  tx.commit()?;
  Ok(raw)
}

/// Hard delete, refused while any contact still points at the company. The
/// count and the delete share a transaction.
pub(crate) fn delete(conn: &mut Connection, id: i64) -> CallResult<()> {
  let tx = conn.transaction()?;
  let known = tx
    .query_row("SELECT 1 FROM companies WHERE id = ?1", [id], |_| Ok(()))
    .optional()?
    .is_some();
  if !known {
    return Err(abort(intel_core::Error::CompanyNotFound(id)));
  }

  let contacts: i64 = tx.query_row(
    "SELECT COUNT(*) FROM contacts WHERE company_id = ?1",
    [id],
    |r| r.get(0),
  )?;
  if contacts > 0 {
    return Err(abort(intel_core::Error::CompanyHasContacts { company_id: id, contacts }));
  }

  tx.execute("DELETE FROM companies WHERE id = ?1", [id])?;
  tx.commit()?;
  Ok(())
}
