//! Reference-data lookups under `/locations`.
//!
//! | Path | Query |
//! |------|-------|
//! | `/locations/countries` | |
//! | `/locations/states` | `?country=US` (default `US`) |
//! | `/locations/cities` | `?state=CA&q=san&limit=20`; `state` required, `q` at least 2 characters |
//! | `/locations/cities/lookup` | `?city=San Jose&state=CA`; exact match on the folded name |

use axum::extract::State as AxumState;
use intel_core::{
  location::{City, CityQuery, Country, State, ascii_fold},
  store::IntelStore,
};
use serde::Deserialize;

use crate::{
  AppState,
  error::ApiError,
  extract::{Data, Query},
};

const DEFAULT_COUNTRY: &str = "US";
const DEFAULT_CITY_LIMIT: u32 = 20;
const MAX_CITY_LIMIT: u32 = 100;
const MIN_CITY_QUERY: usize = 2;

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
  value
    .map(|v| v.trim().to_uppercase())
    .filter(|v| !v.is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
}

/// `GET /locations/countries`
pub async fn countries<S>(
  AxumState(state): AxumState<AppState<S>>,
) -> Result<axum::Json<Data<Vec<Country>>>, ApiError>
where
  S: IntelStore,
{
  let rows = state.store.list_countries().await.map_err(ApiError::store)?;
  Ok(Data::new(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct StatesParams {
  pub country: Option<String>,
}

/// `GET /locations/states`
pub async fn states<S>(
  AxumState(state): AxumState<AppState<S>>,
  Query(params): Query<StatesParams>,
) -> Result<axum::Json<Data<Vec<State>>>, ApiError>
where
  S: IntelStore,
{
  let country = params
    .country
    .map(|c| c.trim().to_uppercase())
    .filter(|c| !c.is_empty())
    .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned());
  let rows = state
    .store
    .list_states(country)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct CitiesParams {
  pub state: Option<String>,
  pub q:     Option<String>,
  pub limit: Option<String>,
}

impl CitiesParams {
  pub fn into_query(self) -> Result<CityQuery, ApiError> {
    let state_code = required(self.state, "state")?;
    let prefix = match self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
      None => None,
      Some(q) if q.chars().count() < MIN_CITY_QUERY => {
        return Err(ApiError::BadRequest(format!(
          "q must be at least {MIN_CITY_QUERY} characters"
        )));
      }
      Some(q) => Some(ascii_fold(q)),
    };
    let limit = self
      .limit
      .as_deref()
      .and_then(|l| l.trim().parse::<u32>().ok())
      .filter(|l| *l > 0)
      .map_or(DEFAULT_CITY_LIMIT, |l| l.min(MAX_CITY_LIMIT));
    Ok(CityQuery { state_code, prefix, limit })
  }
}

/// `GET /locations/cities`
pub async fn cities<S>(
  AxumState(state): AxumState<AppState<S>>,
  Query(params): Query<CitiesParams>,
) -> Result<axum::Json<Data<Vec<City>>>, ApiError>
where
  S: IntelStore,
{
  let query = params.into_query()?;
  let rows = state
    .store
    .search_cities(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Data::new(rows))
}

#[derive(Debug, Default, Deserialize)]
pub struct LookupParams {
  pub city:  Option<String>,
  pub state: Option<String>,
}

/// `GET /locations/cities/lookup`
pub async fn lookup_city<S>(
  AxumState(state): AxumState<AppState<S>>,
  Query(params): Query<LookupParams>,
) -> Result<axum::Json<Data<City>>, ApiError>
where
  S: IntelStore,
{
  let state_code = required(params.state, "state")?;
  let city = params
    .city
    .map(|c| ascii_fold(&c))
    .filter(|c| !c.is_empty())
    .ok_or_else(|| ApiError::BadRequest("city is required".into()))?;
  let found = state
    .store
    .find_city(city.clone(), state_code.clone())
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("city not found: {city}, {state_code}")))?;
  Ok(Data::new(found))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(state: Option<&str>, q: Option<&str>, limit: Option<&str>) -> CitiesParams {
    CitiesParams {
      state: state.map(str::to_owned),
      q:     q.map(str::to_owned),
      limit: limit.map(str::to_owned),
    }
  }

  #[test]
  fn city_query_requires_state() {
    assert!(matches!(
      params(None, Some("san"), None).into_query(),
      Err(ApiError::BadRequest(_))
    ));
  }

  #[test]
  fn city_query_rejects_one_character() {
    assert!(matches!(
      params(Some("CA"), Some("s"), None).into_query(),
      Err(ApiError::BadRequest(_))
    ));
  }

  #[test]
  fn city_query_folds_and_clamps() {
    let q = params(Some("ca"), Some(" São "), Some("5000")).into_query().unwrap();
    assert_eq!(q.state_code, "CA");
    assert_eq!(q.prefix.as_deref(), Some("sao"));
    assert_eq!(q.limit, MAX_CITY_LIMIT);

    let q = params(Some("CA"), Some("  "), Some("junk")).into_query().unwrap();
    assert_eq!(q.prefix, None);
    assert_eq!(q.limit, DEFAULT_CITY_LIMIT);
  }
}
