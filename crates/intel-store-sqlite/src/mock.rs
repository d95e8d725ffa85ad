//! Static demo dataset served when the active source is `mock`.
//!
//! The data is seeded into an in-memory store so mock mode answers every
//! query the same way a real database would.

use intel_core::{
  company::NewCompany,
  contact::{NewContact, Priority},
  location::{Country, LocationInput, NewCity, State},
  note::{NewNote, NoteScope},
  store::IntelStore,
  user::{NewUser, Role},
};
use rusqlite::params;

use crate::{Result, SqliteStore, encode::encode_dt};

const COUNTRIES: &[(&str, &str)] = &[("US", "United States"), ("FR", "France"), ("GB", "United Kingdom")];

const STATES: &[(&str, &str)] = &[("CA", "California"), ("NY", "New York"), ("TX", "Texas")];

/// `(city, state, population)`
const CITIES: &[(&str, &str, i64)] = &[
  ("Los Angeles", "CA", 3_898_747),
  ("San Francisco", "CA", 873_965),
  ("New York", "NY", 8_804_190),
  ("Austin", "TX", 961_855),
];

struct MockContact {
  first:    &'static str,
  last:     &'static str,
  email:    Option<&'static str>,
  priority: Priority,
  company:  Option<usize>,
  location: LocationInput,
}

fn us(state: &str) -> LocationInput {
  LocationInput {
    country_code: Some("US".into()),
    state_code: Some(state.into()),
    ..Default::default()
  }
}

fn abroad(country: &str, city: &str) -> LocationInput {
  LocationInput { country: Some(country.into()), city: Some(city.into()), ..Default::default() }
}

fn contacts() -> Vec<MockContact> {
  vec![
    MockContact {
      first:    "Alice",
      last:     "Johnson",
      email:    Some("alice.johnson@example.com"),
      priority: Priority::High,
      company:  Some(0),
      location: us("CA"),
    },
    MockContact {
      first:    "Bruno",
      last:     "Lefèvre",
      email:    Some("bruno@example.fr"),
      priority: Priority::Medium,
      company:  None,
      location: abroad("France", "Paris"),
    },
    MockContact {
      first:    "Chidi",
      last:     "Okafor",
      email:    None,
      priority: Priority::Low,
      company:  Some(1),
      location: us("NY"),
    },
    MockContact {
      first:    "Dana",
      last:     "Whitfield",
      email:    Some("dana@example.co.uk"),
      priority: Priority::None,
      company:  None,
      location: abroad("United Kingdom", "London"),
    },
  ]
}

/// Open an in-memory store and fill it with the demo dataset.
pub async fn seeded_store() -> Result<SqliteStore> {
  let store = SqliteStore::open_in_memory().await?;

  for (code, name) in COUNTRIES {
    store.add_country(Country { code: (*code).into(), name: (*name).into() }).await?;
  }
  for (code, name) in STATES {
    store
      .add_state(State { code: (*code).into(), name: (*name).into(), country_code: "US".into() })
      .await?;
  }
  for (city, state, population) in CITIES {
    store
      .add_city(NewCity { population: Some(*population), ..NewCity::new(*city, *state) })
      .await?;
  }

  let admin = store
    .create_user(NewUser {
      name:          "Morgan".into(),
      last_name:     Some("Reyes".into()),
      email:         "admin@intel.test".into(),
      role:          Role::Admin,
      password_hash: None,
    })
    .await?;
  let editor = store
    .create_user(NewUser {
      name:          "Sam".into(),
      last_name:     Some("Ito".into()),
      email:         "editor@intel.test".into(),
      role:          Role::Editor,
      password_hash: None,
    })
    .await?;

  let mut company_ids = Vec::new();
  for (name, industry) in [("Northlight Pictures", "Film"), ("Harbor Docs", "Documentary")] {
    let company = store
      .create_company(NewCompany { industry: Some(industry.into()), ..NewCompany::named(name) })
      .await?;
    company_ids.push(company.company.id);
  }

  let mut contact_ids = Vec::new();
  for mock in contacts() {
    let view = store
      .create_contact(
        NewContact {
          email: mock.email.map(str::to_owned),
          priority: mock.priority,
          location: Some(mock.location),
          company_id: mock.company.map(|i| company_ids[i]),
          ..NewContact::new(mock.first, mock.last)
        },
        Some(admin.id),
      )
      .await?;
    contact_ids.push(view.contact.id);
  }

  store.assign_contact(contact_ids[0], editor.id).await?;
  store.assign_contact(contact_ids[0], admin.id).await?;
  store.assign_contact(contact_ids[2], editor.id).await?;

  store
    .create_note(contact_ids[0], editor.clone(), NewNote {
      content: "Met at the spring festival screening.".into(),
      scope:   NoteScope::General,
    })
    .await?;

  let (alice, chidi, editor_id) = (contact_ids[0], contact_ids[2], editor.id);
  let now = encode_dt(chrono::Utc::now());
  store
    .conn
    .call(move |conn| {
      conn.execute(
        "INSERT INTO outreach_events (contact_id, event_type, channel, description, user_id, occurred_at)
         VALUES (?1, 'invitation', 'email', 'Screening invitation sent', ?2, ?3)",
        params![alice, editor_id, now],
      )?;
      conn.execute(
        "INSERT INTO contact_relationships (contact_id, related_contact_id, relationship_type, created_at)
         VALUES (?1, ?2, 'colleague', ?3)",
        params![alice, chidi, now],
      )?;
      Ok(())
    })
    .await?;

  Ok(store)
}

#[cfg(test)]
mod tests {
  use intel_core::query::ContactQuery;

  use super::*;

  #[tokio::test]
  async fn dataset_is_browsable() {
    let store = seeded_store().await.unwrap();
    let page = store.list_contacts(&ContactQuery::default()).await.unwrap();
    assert_eq!(page.pagination.total, 4);

    let alice = page
      .data
      .iter()
      .find(|c| c.contact.first_name == "Alice")
      .unwrap();
    assert_eq!(alice.company_name.as_deref(), Some("Northlight Pictures"));
    assert_eq!(alice.all_assignments.len(), 2);
    assert_eq!(store.list_outreach(alice.contact.id).await.unwrap().len(), 1);
    assert_eq!(store.list_relationships(alice.contact.id).await.unwrap().len(), 1);
  }
}
