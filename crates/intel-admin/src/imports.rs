//! CSV imports for reference data and contacts.
//!
//! Rows are applied one at a time; a bad row is logged with its line number
//! and counted, never aborting the rest of the file.

use std::{collections::HashMap, fmt, io::Read};

use anyhow::{Context as _, Result, ensure};
use clap::ValueEnum;
use intel_core::{
  company::NewCompany,
  contact::{NewContact, Priority},
  location::{Country, LocationInput, NewCity, State, ascii_fold},
  query::{CompanyQuery, MAX_LIMIT, Pagination},
  store::IntelStore,
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

/// Deserialize blank cells as `None`.
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  let s: Option<String> = Option::deserialize(deserializer)?;
  Ok(s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty()))
}

// ─── Stats ───────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportStats {
  pub imported: u32,
  pub failed:   u32,
}

impl fmt::Display for ImportStats {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} imported, {} failed", self.imported, self.failed)
  }
}

/// Drive `apply` over every row of `reader`. Line numbers count the header.
async fn each_row<R, T, F, Fut>(reader: R, mut apply: F) -> Result<ImportStats>
where
  R: Read,
  T: DeserializeOwned,
  F: FnMut(T) -> Fut,
  Fut: std::future::Future<Output = Result<()>>,
{
  let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
  csv_reader.headers().context("failed to read CSV header")?;

  let mut stats = ImportStats::default();
  for (idx, record) in csv_reader.deserialize::<T>().enumerate() {
    let line = idx + 2;
    let row = match record {
      Ok(row) => row,
      Err(e) => {
        tracing::warn!(line, error = %e, "unparseable row");
        stats.failed += 1;
        continue;
      }
    };
    match apply(row).await {
      Ok(()) => stats.imported += 1,
      Err(e) => {
        tracing::warn!(line, error = %format!("{e:#}"), "row rejected");
        stats.failed += 1;
      }
    }
  }
  Ok(stats)
}

// ─── Locations ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LocationKind {
  Countries,
  States,
  Cities,
}

#[derive(Debug, Deserialize)]
struct CountryRow {
  #[serde(alias = "iso2")]
  code: String,
  name: String,
}

#[derive(Debug, Deserialize)]
struct StateRow {
  #[serde(alias = "state_id")]
  code:         String,
  #[serde(alias = "state_name")]
  name:         String,
  #[serde(default = "default_country", alias = "country")]
  country_code: String,
}

fn default_country() -> String { "US".to_owned() }

/// Column names follow the common US-cities dataset layout.
#[derive(Debug, Deserialize)]
struct CityRow {
  city:        String,
  #[serde(default, deserialize_with = "blank_as_none")]
  city_ascii:  Option<String>,
  #[serde(alias = "state_id")]
  state_code:  String,
  #[serde(default, deserialize_with = "blank_as_none")]
  county_name: Option<String>,
  #[serde(default)]
  lat:         Option<f64>,
  #[serde(default)]
  lng:         Option<f64>,
  #[serde(default)]
  population:  Option<f64>,
  #[serde(default)]
  density:     Option<f64>,
  #[serde(default, deserialize_with = "blank_as_none")]
  timezone:    Option<String>,
}

impl CityRow {
  fn into_new_city(self) -> Result<NewCity> {
    let population = self.population.map(whole_population).transpose()?;
    Ok(NewCity {
      city:        self.city,
      city_ascii:  self.city_ascii,
      state_code:  self.state_code.to_uppercase(),
      county_name: self.county_name,
      lat:         self.lat,
      lng:         self.lng,
      population,
      density:     self.density,
      timezone:    self.timezone,
    })
  }
}

/// Population cells are sometimes written as floats (`1013240.0`).
fn whole_population(p: f64) -> Result<i64> {
  ensure!(p.is_finite() && p >= 0.0, "population must be a non-negative number, got {p}");
  let rounded = p.round();
  ensure!(rounded < i64::MAX as f64, "population {p} is out of range");
  Ok(rounded as i64)
}

pub async fn import_locations<S, R>(store: &S, kind: LocationKind, reader: R) -> Result<ImportStats>
where
  S: IntelStore,
  R: Read,
{
  match kind {
    LocationKind::Countries => {
      each_row(reader, |row: CountryRow| async move {
        store
          .add_country(Country { code: row.code.to_uppercase(), name: row.name })
          .await?;
        Ok(())
      })
      .await
    }
    LocationKind::States => {
      each_row(reader, |row: StateRow| async move {
        store
          .add_state(State {
            code:         row.code.to_uppercase(),
            name:         row.name,
            country_code: row.country_code.to_uppercase(),
          })
          .await?;
        Ok(())
      })
      .await
    }
    LocationKind::Cities => {
      each_row(reader, |row: CityRow| async move {
        store.add_city(row.into_new_city()?).await?;
        Ok(())
      })
      .await
    }
  }
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ContactRow {
  first_name:        String,
  last_name:         String,
  #[serde(default, deserialize_with = "blank_as_none")]
  email:             Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  email_secondary:   Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  linkedin_url:      Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  imdb_url:          Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  wikipedia_url:     Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  biography:         Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  priority:          Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  company:           Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  country:           Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  state:             Option<String>,
  #[serde(default, deserialize_with = "blank_as_none")]
  city:              Option<String>,
}

fn is_us(country: &str) -> bool {
  ["us", "usa", "united states", "united states of america"]
    .contains(&country.to_lowercase().as_str())
}

/// Resolves company names to ids, creating missing companies once.
struct Companies<'a, S> {
  store: &'a S,
  known: HashMap<String, i64>,
}

impl<'a, S: IntelStore> Companies<'a, S> {
  fn new(store: &'a S) -> Self { Self { store, known: HashMap::new() } }

  async fn resolve(&mut self, name: &str) -> Result<i64> {
    let key = name.to_lowercase();
    if let Some(id) = self.known.get(&key) {
      return Ok(*id);
    }

    let query = CompanyQuery {
      pagination: Pagination::new(1, MAX_LIMIT),
      search:     Some(name.to_owned()),
    };
    let existing = self
      .store
      .list_companies(&query)
      .await?
      .data
      .into_iter()
      .find(|c| c.company.name.to_lowercase() == key);
    let id = match existing {
      Some(view) => view.company.id,
      None => {
        let created = self.store.create_company(NewCompany::named(name)).await?;
        tracing::info!(company = name, "created company");
        created.company.id
      }
    };
    self.known.insert(key, id);
    Ok(id)
  }
}

impl ContactRow {
  async fn location<S: IntelStore>(&self, store: &S) -> Result<Option<LocationInput>> {
    let Some(country) = self.country.as_deref() else {
      if self.state.is_none() && self.city.is_none() {
        return Ok(None);
      }
      return Ok(Some(LocationInput {
        state: self.state.clone(),
        city: self.city.clone(),
        ..Default::default()
      }));
    };

    if !is_us(country) {
      return Ok(Some(LocationInput {
        country: Some(country.to_owned()),
        state: self.state.clone(),
        city: self.city.clone(),
        ..Default::default()
      }));
    }

    let state_code = self.state.as_deref().map(str::to_uppercase);
    let city_id = match (&state_code, self.city.as_deref()) {
      (Some(state), Some(city)) => {
        let found = store.find_city(ascii_fold(city), state.clone()).await?;
        if found.is_none() {
          tracing::warn!(city, state = %state, "city not in reference data; keeping state only");
        }
        found.map(|c| c.id)
      }
      _ => None,
    };
    Ok(Some(LocationInput {
      country_code: Some("US".to_owned()),
      state_code,
      city_id,
      ..Default::default()
    }))
  }
}

pub async fn import_contacts<S, R>(store: &S, reader: R) -> Result<ImportStats>
where
  S: IntelStore,
  R: Read,
{
  let companies = tokio::sync::Mutex::new(Companies::new(store));
  let companies = &companies;
  each_row(reader, |row: ContactRow| async move {
    let priority = row
      .priority
      .as_deref()
      .map(|p| p.to_uppercase().parse::<Priority>())
      .transpose()
      .map_err(|_| anyhow::anyhow!("invalid priority {:?}", row.priority))?
      .unwrap_or_default();
    let company_id = match row.company.as_deref() {
      Some(name) => Some(companies.lock().await.resolve(name).await?),
      None => None,
    };
    let location = row.location(store).await?;

    let input = NewContact {
      email: row.email,
      email_secondary: row.email_secondary,
      linkedin_url: row.linkedin_url,
      imdb_url: row.imdb_url,
      wikipedia_url: row.wikipedia_url,
      biography: row.biography,
      priority,
      location,
      company_id,
      ..NewContact::new(row.first_name, row.last_name)
    };
    store.create_contact(input, None).await?;
    Ok(())
  })
  .await
}

#[cfg(test)]
mod tests {
  use intel_core::query::{CompanyQuery, ContactQuery};
  use intel_store_sqlite::SqliteStore;

  use super::*;

  async fn store_with_cities() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    import_locations(&store, LocationKind::Countries, "code,name\nUS,United States\n".as_bytes())
      .await
      .unwrap();
    import_locations(
      &store,
      LocationKind::States,
      "state_id,state_name\nCA,California\nNY,New York\n".as_bytes(),
    )
    .await
    .unwrap();
    let cities = "city,city_ascii,state_id,county_name,lat,lng,population,density,timezone\n\
                  San José,San Jose,CA,Santa Clara,37.3,-121.8,1013240,2140.1,America/Los_Angeles\n\
                  Albany,Albany,NY,Albany,42.6,-73.7,,,\n";
    let stats = import_locations(&store, LocationKind::Cities, cities.as_bytes())
      .await
      .unwrap();
    assert_eq!(stats, ImportStats { imported: 2, failed: 0 });
    store
  }

  #[tokio::test]
  async fn cities_are_matched_by_folded_name() {
    let store = store_with_cities().await;
    let city = store
      .find_city("san jose".into(), "CA".into())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(city.city, "San José");
    assert_eq!(city.population, Some(1_013_240));
  }

  #[tokio::test]
  async fn cities_with_unusable_population_fail() {
    let store = store_with_cities().await;
    let cities = "city,city_ascii,state_id,population\n\
                  Fresno,Fresno,CA,NaN\n\
                  Reno,Reno,CA,inf\n\
                  Oakland,Oakland,CA,-4\n\
                  Sacramento,Sacramento,CA,524943.6\n";
    let stats = import_locations(&store, LocationKind::Cities, cities.as_bytes())
      .await
      .unwrap();
    assert_eq!(stats, ImportStats { imported: 1, failed: 3 });

    assert!(store.find_city("fresno".into(), "CA".into()).await.unwrap().is_none());
    let city = store
      .find_city("sacramento".into(), "CA".into())
      .await
      .unwrap()
      .unwrap();
    assert_eq!(city.population, Some(524_944));
  }

  #[tokio::test]
  async fn contacts_resolve_companies_and_locations() {
    let store = store_with_cities().await;
    let csv = "first_name,last_name,email,priority,company,country,state,city\n\
               Ann,Archer,ann@example.com,high,Acme,US,CA,San Jose\n\
               Ben,Baker,,LOW,acme,France,,Paris\n\
               Cal,,cal@example.com,URGENT,,,,\n\
               Dee,Dunn,not-an-email,,,,,\n";
    let stats = import_contacts(&store, csv.as_bytes()).await.unwrap();
    assert_eq!(stats, ImportStats { imported: 2, failed: 2 });

    let companies = store.list_companies(&CompanyQuery::default()).await.unwrap();
    assert_eq!(companies.pagination.total, 1, "company names match ignoring case");
    assert_eq!(companies.data[0].contact_count, 2);

    let contacts = store.list_contacts(&ContactQuery::default()).await.unwrap();
    let ann = contacts
      .data
      .iter()
      .find(|c| c.contact.first_name == "Ann")
      .unwrap();
    assert_eq!(ann.contact.priority, Priority::High);
    let loc = ann.contact.location.as_ref().unwrap();
    assert_eq!(loc.state_code.as_deref(), Some("CA"));
    assert!(loc.city_id.is_some());

    let ben = contacts
      .data
      .iter()
      .find(|c| c.contact.first_name == "Ben")
      .unwrap();
    let loc = ben.contact.location.as_ref().unwrap();
    assert_eq!(loc.country.as_deref(), Some("France"));
    assert_eq!(loc.city.as_deref(), Some("Paris"));
    assert_eq!(loc.city_id, None);
  }
}
