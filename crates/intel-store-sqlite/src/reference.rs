//! Countries, states and cities.

use intel_core::location::{City, CityQuery, Country, NewCity, State};
use rusqlite::{Connection, OptionalExtension as _, params};

use crate::{
  encode::{CITY_SELECT, prefix_pattern, read_city},
  error::CallResult,
};

pub(crate) fn upsert_country(conn: &Connection, country: &Country) -> CallResult<()> {
  conn.execute(
    "INSERT INTO countries (code, name) VALUES (?1, ?2)
     ON CONFLICT (code) DO UPDATE SET name = excluded.name",
    params![country.code, country.name],
  )?;
  Ok(())
}

pub(crate) fn countries(conn: &Connection) -> CallResult<Vec<Country>> {
  let mut stmt = conn.prepare("SELECT code, name FROM countries ORDER BY name")?;
  let rows = stmt
    .query_map([], |r| Ok(Country { code: r.get(0)?, name: r.get(1)? }))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub(crate) fn upsert_state(conn: &Connection, state: &State) -> CallResult<()> {
  conn.execute(
    "INSERT INTO states (code, name, country_code) VALUES (?1, ?2, ?3)
     ON CONFLICT (code, country_code) DO UPDATE SET name = excluded.name",
    params![state.code, state.name, state.country_code],
  )?;
  Ok(())
}

pub(crate) fn states(conn: &Connection, country_code: &str) -> CallResult<Vec<State>> {
  let mut stmt = conn.prepare(
    "SELECT code, name, country_code FROM states WHERE country_code = ?1 ORDER BY name",
  )?;
  let rows = stmt
    .query_map([country_code], |r| {
      Ok(State { code: r.get(0)?, name: r.get(1)?, country_code: r.get(2)? })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// Insert a city unless its matching key is already present; either way
/// return the stored row.
pub(crate) fn insert_city(conn: &Connection, city: &NewCity, city_ascii: &str) -> CallResult<City> {
  conn.execute(
    "INSERT INTO cities (
       city, city_ascii, state_code, county_name, lat, lng, population, density, timezone
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
     ON CONFLICT (city_ascii, state_code) DO NOTHING",
    params![
      city.city,
      city_ascii,
      city.state_code,
      city.county_name,
      city.lat,
      city.lng,
      city.population,
      city.density,
      city.timezone,
    ],
  )?;
  Ok(conn.query_row(
    &format!("{CITY_SELECT} WHERE city_ascii = ?1 AND state_code = ?2"),
    params![city_ascii, city.state_code],
    read_city,
  )?)
}

pub(crate) fn search_cities(conn: &Connection, query: &CityQuery) -> CallResult<Vec<City>> {
  let pattern = query.prefix.as_deref().map(prefix_pattern);
  let mut stmt = conn.prepare(&format!(
    "{CITY_SELECT}
     WHERE state_code = ?1 AND (?2 IS NULL OR city_ascii LIKE ?2 ESCAPE '\\')
     ORDER BY population DESC NULLS LAST, city, id
     LIMIT ?3"
  ))?;
  let rows = stmt
    .query_map(params![query.state_code, pattern, query.limit], read_city)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

pub(crate) fn find_city(conn: &Connection, city_ascii: &str, state_code: &str) -> CallResult<Option<City>> {
  Ok(
    conn
      .query_row(
        &format!("{CITY_SELECT} WHERE city_ascii = ?1 AND state_code = ?2"),
        params![city_ascii, state_code],
        read_city,
      )
      .optional()?,
  )
}
