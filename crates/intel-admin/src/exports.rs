//! CSV export of contacts.

use std::io::Write;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use intel_core::{
  contact::{ContactView, Priority},
  query::{ContactQuery, MAX_LIMIT, Pagination, StatusFilter},
  store::IntelStore,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ExportRow {
  id:               i64,
  first_name:       String,
  last_name:        String,
  email:            Option<String>,
  email_secondary:  Option<String>,
  linkedin_url:     Option<String>,
  priority:         Priority,
  is_active:        bool,
  inactive_reason:  Option<String>,
  company:          Option<String>,
  country:          Option<String>,
  state:            Option<String>,
  city:             Option<String>,
  assigned_to:      Option<String>,
  created_at:       DateTime<Utc>,
}

impl From<ContactView> for ExportRow {
  fn from(view: ContactView) -> Self {
    let c = view.contact;
    let loc = c.location.unwrap_or_default();
    let assigned_to = view.assigned_to_name.map(|first| match view.assigned_to_last_name {
      Some(last) => format!("{first} {last}"),
      None => first,
    });
    Self {
      id: c.id,
      first_name: c.first_name,
      last_name: c.last_name,
      email: c.email,
      email_secondary: c.email_secondary,
      linkedin_url: c.linkedin_url,
      priority: c.priority,
      is_active: c.is_active,
      inactive_reason: c.inactive_reason,
      company: view.company_name,
      country: loc.country_name.or(loc.country),
      state: loc.state_name.or(loc.state),
      city: loc.city_name.or(loc.city),
      assigned_to,
      created_at: c.created_at,
    }
  }
}

/// Write every contact, newest first, to `writer`. Returns the row count.
pub async fn export_contacts<S, W>(store: &S, writer: W, active_only: bool) -> Result<u64>
where
  S: IntelStore,
  W: Write,
{
  let mut csv_writer = csv::Writer::from_writer(writer);
  let status = if active_only { StatusFilter::Active } else { StatusFilter::All };

  let mut written = 0;
  let mut page = 1;
  loop {
    let query = ContactQuery {
      pagination: Pagination::new(page, MAX_LIMIT),
      status,
      ..Default::default()
    };
    let result = store.list_contacts(&query).await?;
    for view in result.data {
      csv_writer
        .serialize(ExportRow::from(view))
        .context("failed to write CSV row")?;
      written += 1;
    }
    if !result.pagination.has_next {
      break;
    }
    page += 1;
  }

  csv_writer.flush().context("failed to flush CSV output")?;
  Ok(written)
}

#[cfg(test)]
mod tests {
  use intel_core::contact::NewContact;
  use intel_store_sqlite::SqliteStore;

  use super::*;

  #[tokio::test]
  async fn exports_every_page() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let total = MAX_LIMIT + 5;
    for i in 0..total {
      store
        .create_contact(NewContact::new(format!("P{i}"), "Row"), None)
        .await
        .unwrap();
    }
    let gone = store
      .create_contact(NewContact::new("Gone", "Row"), None)
      .await
      .unwrap();
    store
      .deactivate_contact(gone.contact.id, Some("left".into()), None)
      .await
      .unwrap();

    let mut out = Vec::new();
    let written = export_contacts(&store, &mut out, true).await.unwrap();
    assert_eq!(written, u64::from(total));

    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("id,first_name,last_name,"));
    assert_eq!(text.lines().count(), total as usize + 1);
    assert!(!text.contains("Gone"));

    let mut all = Vec::new();
    assert_eq!(export_contacts(&store, &mut all, false).await.unwrap(), u64::from(total) + 1);
  }
}
