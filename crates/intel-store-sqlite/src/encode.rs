//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 UTC strings with fixed microsecond
//! precision, so lexical order equals chronological order. Enums are stored
//! as their serde tags.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use intel_core::{
  activity::{Assignment, HistoryAction, HistoryEntry, OutreachEvent, Relationship},
  company::{Company, CompanyView},
  contact::{AssigneeSummary, Contact, ContactView, Priority},
  location::{City, Location, ResolvedLocation},
  note::{Note, NoteScope},
  user::{Role, User},
};
use rusqlite::{Row, types::Value};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_opt_dt(s: Option<&str>) -> Result<Option<DateTime<Utc>>> {
  s.map(decode_dt).transpose()
}

// ─── Enum tags ───────────────────────────────────────────────────────────────

fn decode_tag<T: FromStr>(what: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown {what}: {s:?}")))
}

// ─── LIKE patterns ───────────────────────────────────────────────────────────

/// Escape `%`, `_` and `\` so user input matches literally under
/// `LIKE ... ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
  let mut out = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out
}

pub fn contains_pattern(term: &str) -> String { format!("%{}%", escape_like(term)) }

pub fn prefix_pattern(term: &str) -> String { format!("{}%", escape_like(term)) }

// ─── Sparse updates ──────────────────────────────────────────────────────────

/// Column assignments for an `UPDATE`, collected from the keys present in a
/// patch. Values are always bound, never spliced into the SQL text.
#[derive(Debug, Default)]
pub struct UpdateSet {
  columns: Vec<&'static str>,
  values:  Vec<Value>,
}

impl UpdateSet {
  pub fn set(&mut self, column: &'static str, value: impl Into<Value>) {
    self.columns.push(column);
    self.values.push(value.into());
  }

  /// Builds `UPDATE {table} SET .. WHERE id = ?n` with `id` bound last.
  pub fn into_statement(self, table: &str, id: i64) -> (String, Vec<Value>) {
    let assignments = self
      .columns
      .iter()
      .enumerate()
      .map(|(i, col)| format!("{col} = ?{}", i + 1))
      .collect::<Vec<_>>()
      .join(", ");
    let sql = format!(
      "UPDATE {table} SET {assignments} WHERE id = ?{}",
      self.columns.len() + 1
    );
    let mut values = self.values;
    values.push(Value::Integer(id));
    (sql, values)
  }
}

// ─── Location ────────────────────────────────────────────────────────────────

/// The six location columns of a contact, exactly one half populated.
#[derive(Debug, Default)]
pub struct LocationColumns {
  pub country_code: Option<String>,
  pub state_code:   Option<String>,
  pub city_id:      Option<i64>,
  pub country:      Option<String>,
  pub state:        Option<String>,
  pub city:         Option<String>,
}

impl From<Option<Location>> for LocationColumns {
  fn from(location: Option<Location>) -> Self {
    match location {
      None => Self::default(),
      Some(Location::Structured { state_code, city_id }) => Self {
        country_code: Some(intel_core::location::STRUCTURED_COUNTRY.to_owned()),
        state_code,
        city_id,
        ..Self::default()
      },
      Some(Location::FreeText { country, state, city }) => Self {
        country,
        state,
        city,
        ..Self::default()
      },
    }
  }
}

// ─── Contacts ────────────────────────────────────────────────────────────────

/// Ranks each contact's assignments by id and keeps the first, so joining it
/// never multiplies contact rows.
pub const FIRST_ASSIGNMENT_CTE: &str = "
WITH first_assignments AS (
    SELECT contact_id, user_id
    FROM (
        SELECT contact_id, user_id,
               ROW_NUMBER() OVER (PARTITION BY contact_id ORDER BY id) AS rn
        FROM contact_assignments
    )
    WHERE rn = 1
)";

/// Column list read by [`read_contact`]; must be preceded by
/// [`FIRST_ASSIGNMENT_CTE`].
pub const CONTACT_SELECT: &str = "
SELECT
    c.id, c.first_name, c.last_name, c.email, c.email_secondary,
    c.linkedin_url, c.facebook_url, c.instagram_url, c.imdb_url, c.wikipedia_url,
    c.biography, c.priority, c.seen_film, c.doc_branch_member,
    c.country_code, c.state_code, c.city_id,
    cn.name, st.name, ci.city,
    c.location_country, c.location_state, c.location_city,
    c.is_active, c.inactive_reason, c.inactive_at, c.company_id,
    c.created_at, c.updated_at,
    co.name, co.website, co.industry,
    fa.user_id, u.name, u.last_name
FROM contacts c
LEFT JOIN companies co        ON co.id = c.company_id
LEFT JOIN countries cn        ON cn.code = c.country_code
LEFT JOIN states st           ON st.code = c.state_code AND st.country_code = c.country_code
LEFT JOIN cities ci           ON ci.id = c.city_id
LEFT JOIN first_assignments fa ON fa.contact_id = c.id
LEFT JOIN users u             ON u.id = fa.user_id";

/// Raw values read directly from a [`CONTACT_SELECT`] row.
pub struct RawContact {
  pub id:                    i64,
  pub first_name:            String,
  pub last_name:             String,
  pub email:                 Option<String>,
  pub email_secondary:       Option<String>,
  pub linkedin_url:          Option<String>,
  pub facebook_url:          Option<String>,
  pub instagram_url:         Option<String>,
  pub imdb_url:              Option<String>,
  pub wikipedia_url:         Option<String>,
  pub biography:             Option<String>,
  pub priority:              String,
  pub seen_film:             bool,
  pub doc_branch_member:     bool,
  pub location:              ResolvedLocation,
  pub is_active:             bool,
  pub inactive_reason:       Option<String>,
  pub inactive_at:           Option<String>,
  pub company_id:            Option<i64>,
  pub created_at:            String,
  pub updated_at:            String,
  pub company_name:          Option<String>,
  pub company_website:       Option<String>,
  pub company_industry:      Option<String>,
  pub assigned_to:           Option<i64>,
  pub assigned_to_name:      Option<String>,
  pub assigned_to_last_name: Option<String>,
}

pub fn read_contact(row: &Row<'_>) -> rusqlite::Result<RawContact> {
  Ok(RawContact {
    id:                    row.get(0)?,
    first_name:            row.get(1)?,
    last_name:             row.get(2)?,
    email:                 row.get(3)?,
    email_secondary:       row.get(4)?,
    linkedin_url:          row.get(5)?,
    facebook_url:          row.get(6)?,
    instagram_url:         row.get(7)?,
    imdb_url:              row.get(8)?,
    wikipedia_url:         row.get(9)?,
    biography:             row.get(10)?,
    priority:              row.get(11)?,
    seen_film:             row.get(12)?,
    doc_branch_member:     row.get(13)?,
    location:              ResolvedLocation {
      country_code: row.get(14)?,
      state_code:   row.get(15)?,
      city_id:      row.get(16)?,
      country_name: row.get(17)?,
      state_name:   row.get(18)?,
      city_name:    row.get(19)?,
      country:      row.get(20)?,
      state:        row.get(21)?,
      city:         row.get(22)?,
    },
    is_active:             row.get(23)?,
    inactive_reason:       row.get(24)?,
    inactive_at:           row.get(25)?,
    company_id:            row.get(26)?,
    created_at:            row.get(27)?,
    updated_at:            row.get(28)?,
    company_name:          row.get(29)?,
    company_website:       row.get(30)?,
    company_industry:      row.get(31)?,
    assigned_to:           row.get(32)?,
    assigned_to_name:      row.get(33)?,
    assigned_to_last_name: row.get(34)?,
  })
}

impl RawContact {
  pub fn into_view(self, all_assignments: Vec<AssigneeSummary>) -> Result<ContactView> {
    let priority: Priority = decode_tag("priority", &self.priority)?;
    let location = (!self.location.is_empty()).then_some(self.location);

    let contact = Contact {
      id: self.id,
      first_name: self.first_name,
      last_name: self.last_name,
      email: self.email,
      email_secondary: self.email_secondary,
      linkedin_url: self.linkedin_url,
      facebook_url: self.facebook_url,
      instagram_url: self.instagram_url,
      imdb_url: self.imdb_url,
      wikipedia_url: self.wikipedia_url,
      biography: self.biography,
      priority,
      seen_film: self.seen_film,
      doc_branch_member: self.doc_branch_member,
      location,
      is_active: self.is_active,
      inactive_reason: self.inactive_reason,
      inactive_at: decode_opt_dt(self.inactive_at.as_deref())?,
      company_id: self.company_id,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    };

    Ok(ContactView {
      contact,
      company_name: self.company_name,
      company_website: self.company_website,
      company_industry: self.company_industry,
      assigned_to: self.assigned_to,
      assigned_to_name: self.assigned_to_name,
      assigned_to_last_name: self.assigned_to_last_name,
      all_assignments,
    })
  }
}

// ─── Companies ───────────────────────────────────────────────────────────────

pub const COMPANY_SELECT: &str = "
SELECT
    co.id, co.name, co.website, co.linkedin_url, co.industry, co.size,
    co.description, co.logo_url, co.country_code, co.state_code, co.city_id,
    co.created_at, co.updated_at,
    cn.name, st.name, ci.city,
    (SELECT COUNT(*) FROM contacts c WHERE c.company_id = co.id)
FROM companies co
LEFT JOIN countries cn ON cn.code = co.country_code
LEFT JOIN states st    ON st.code = co.state_code AND st.country_code = co.country_code
LEFT JOIN cities ci    ON ci.id = co.city_id";

pub struct RawCompany {
  pub id:            i64,
  pub name:          String,
  pub website:       Option<String>,
  pub linkedin_url:  Option<String>,
  pub industry:      Option<String>,
  pub size:          Option<String>,
  pub description:   Option<String>,
  pub logo_url:      Option<String>,
  pub country_code:  Option<String>,
  pub state_code:    Option<String>,
  pub city_id:       Option<i64>,
  pub created_at:    String,
  pub updated_at:    String,
  pub country_name:  Option<String>,
  pub state_name:    Option<String>,
  pub city_name:     Option<String>,
  pub contact_count: i64,
}

pub fn read_company(row: &Row<'_>) -> rusqlite::Result<RawCompany> {
  Ok(RawCompany {
    id:            row.get(0)?,
    name:          row.get(1)?,
    website:       row.get(2)?,
    linkedin_url:  row.get(3)?,
    industry:      row.get(4)?,
    size:          row.get(5)?,
    description:   row.get(6)?,
    logo_url:      row.get(7)?,
    country_code:  row.get(8)?,
    state_code:    row.get(9)?,
    city_id:       row.get(10)?,
    created_at:    row.get(11)?,
    updated_at:    row.get(12)?,
    country_name:  row.get(13)?,
    state_name:    row.get(14)?,
    city_name:     row.get(15)?,
    contact_count: row.get(16)?,
  })
}

impl RawCompany {
  pub fn into_view(self) -> Result<CompanyView> {
    Ok(CompanyView {
      company:       Company {
        id: self.id,
        name: self.name,
        website: self.website,
        linkedin_url: self.linkedin_url,
        industry: self.industry,
        size: self.size,
        description: self.description,
        logo_url: self.logo_url,
        country_code: self.country_code,
        state_code: self.state_code,
        city_id: self.city_id,
        created_at: decode_dt(&self.created_at)?,
        updated_at: decode_dt(&self.updated_at)?,
      },
      country_name:  self.country_name,
      state_name:    self.state_name,
      city_name:     self.city_name,
      contact_count: self.contact_count,
    })
  }
}

// ─── Cities ──────────────────────────────────────────────────────────────────

pub const CITY_SELECT: &str = "
SELECT id, city, city_ascii, state_code, county_name, lat, lng, population, density, timezone
FROM cities";

pub fn read_city(row: &Row<'_>) -> rusqlite::Result<City> {
  Ok(City {
    id:          row.get(0)?,
    city:        row.get(1)?,
    city_ascii:  row.get(2)?,
    state_code:  row.get(3)?,
    county_name: row.get(4)?,
    lat:         row.get(5)?,
    lng:         row.get(6)?,
    population:  row.get(7)?,
    density:     row.get(8)?,
    timezone:    row.get(9)?,
  })
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_SELECT: &str =
  "SELECT u.id, u.name, u.last_name, u.email, u.role, u.created_at FROM users u";

pub struct RawUser {
  pub id:         i64,
  pub name:       String,
  pub last_name:  Option<String>,
  pub email:      String,
  pub role:       String,
  pub created_at: String,
}

pub fn read_user(row: &Row<'_>) -> rusqlite::Result<RawUser> {
  Ok(RawUser {
    id:         row.get(0)?,
    name:       row.get(1)?,
    last_name:  row.get(2)?,
    email:      row.get(3)?,
    role:       row.get(4)?,
    created_at: row.get(5)?,
  })
}

impl RawUser {
  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:         self.id,
      name:       self.name,
      last_name:  self.last_name,
      email:      self.email,
      role:       decode_tag::<Role>("role", &self.role)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Notes ───────────────────────────────────────────────────────────────────

pub const NOTE_SELECT: &str = "
SELECT n.id, n.contact_id, n.user_id, u.name, u.last_name, n.scope, n.content,
       n.is_edited, n.edited_at, n.created_at
FROM notes n
JOIN users u ON u.id = n.user_id";

pub struct RawNote {
  pub id:               i64,
  pub contact_id:       i64,
  pub user_id:          i64,
  pub author_name:      String,
  pub author_last_name: Option<String>,
  pub scope:            String,
  pub content:          String,
  pub is_edited:        bool,
  pub edited_at:        Option<String>,
  pub created_at:       String,
}

pub fn read_note(row: &Row<'_>) -> rusqlite::Result<RawNote> {
  Ok(RawNote {
    id:               row.get(0)?,
    contact_id:       row.get(1)?,
    user_id:          row.get(2)?,
    author_name:      row.get(3)?,
    author_last_name: row.get(4)?,
    scope:            row.get(5)?,
    content:          row.get(6)?,
    is_edited:        row.get(7)?,
    edited_at:        row.get(8)?,
    created_at:       row.get(9)?,
  })
}

impl RawNote {
  pub fn into_note(self) -> Result<Note> {
    Ok(Note {
      id:               self.id,
      contact_id:       self.contact_id,
      user_id:          self.user_id,
      author_name:      self.author_name,
      author_last_name: self.author_last_name,
      scope:            decode_tag::<NoteScope>("note scope", &self.scope)?,
      content:          self.content,
      is_edited:        self.is_edited,
      edited_at:        decode_opt_dt(self.edited_at.as_deref())?,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

// ─── History ─────────────────────────────────────────────────────────────────

pub struct RawHistory {
  pub id:         i64,
  pub contact_id: i64,
  pub action:     String,
  pub changes:    Option<String>,
  pub reason:     Option<String>,
  pub user_id:    Option<i64>,
  pub created_at: String,
}

pub fn read_history(row: &Row<'_>) -> rusqlite::Result<RawHistory> {
  Ok(RawHistory {
    id:         row.get(0)?,
    contact_id: row.get(1)?,
    action:     row.get(2)?,
    changes:    row.get(3)?,
    reason:     row.get(4)?,
    user_id:    row.get(5)?,
    created_at: row.get(6)?,
  })
}

impl RawHistory {
  pub fn into_entry(self) -> Result<HistoryEntry> {
    Ok(HistoryEntry {
      id:         self.id,
      contact_id: self.contact_id,
      action:     decode_tag::<HistoryAction>("history action", &self.action)?,
      changes:    self.changes.as_deref().map(serde_json::from_str).transpose()?,
      reason:     self.reason,
      user_id:    self.user_id,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Assignments ─────────────────────────────────────────────────────────────

pub struct RawAssignment {
  pub id:             i64,
  pub contact_id:     i64,
  pub user_id:        i64,
  pub user_name:      String,
  pub user_last_name: Option<String>,
  pub assigned_at:    String,
}

pub fn read_assignment(row: &Row<'_>) -> rusqlite::Result<RawAssignment> {
  Ok(RawAssignment {
    id:             row.get(0)?,
    contact_id:     row.get(1)?,
    user_id:        row.get(2)?,
    user_name:      row.get(3)?,
    user_last_name: row.get(4)?,
    assigned_at:    row.get(5)?,
  })
}

impl RawAssignment {
  pub fn into_assignment(self) -> Result<Assignment> {
    Ok(Assignment {
      id:             self.id,
      contact_id:     self.contact_id,
      user_id:        self.user_id,
      user_name:      self.user_name,
      user_last_name: self.user_last_name,
      assigned_at:    decode_dt(&self.assigned_at)?,
    })
  }
}

// ─── Outreach & relationships ────────────────────────────────────────────────

pub struct RawOutreach {
  pub id:          i64,
  pub contact_id:  i64,
  pub event_type:  String,
  pub channel:     Option<String>,
  pub description: Option<String>,
  pub user_id:     Option<i64>,
  pub occurred_at: String,
}

pub fn read_outreach(row: &Row<'_>) -> rusqlite::Result<RawOutreach> {
  Ok(RawOutreach {
    id:          row.get(0)?,
    contact_id:  row.get(1)?,
    event_type:  row.get(2)?,
    channel:     row.get(3)?,
    description: row.get(4)?,
    user_id:     row.get(5)?,
    occurred_at: row.get(6)?,
  })
}

impl RawOutreach {
  pub fn into_event(self) -> Result<OutreachEvent> {
    Ok(OutreachEvent {
      id:          self.id,
      contact_id:  self.contact_id,
      event_type:  self.event_type,
      channel:     self.channel,
      description: self.description,
      user_id:     self.user_id,
      occurred_at: decode_dt(&self.occurred_at)?,
    })
  }
}

pub struct RawRelationship {
  pub id:                 i64,
  pub contact_id:         i64,
  pub related_contact_id: i64,
  pub related_name:       String,
  pub relationship_type:  String,
  pub created_at:         String,
}

pub fn read_relationship(row: &Row<'_>) -> rusqlite::Result<RawRelationship> {
  Ok(RawRelationship {
    id:                 row.get(0)?,
    contact_id:         row.get(1)?,
    related_contact_id: row.get(2)?,
    related_name:       row.get(3)?,
    relationship_type:  row.get(4)?,
    created_at:         row.get(5)?,
  })
}

impl RawRelationship {
  pub fn into_relationship(self) -> Result<Relationship> {
    Ok(Relationship {
      id:                 self.id,
      contact_id:         self.contact_id,
      related_contact_id: self.related_contact_id,
      related_name:       self.related_name,
      relationship_type:  self.relationship_type,
      created_at:         decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(contains_pattern("Al"), "%Al%");
    assert_eq!(prefix_pattern("san"), "san%");
  }

  #[test]
  fn update_set_binds_id_last() {
    let mut set = UpdateSet::default();
    set.set("priority", "HIGH".to_owned());
    set.set("email", None::<String>);
    let (sql, values) = set.into_statement("contacts", 7);
    assert_eq!(sql, "UPDATE contacts SET priority = ?1, email = ?2 WHERE id = ?3");
    assert_eq!(values, vec![Value::Text("HIGH".into()), Value::Null, Value::Integer(7)]);
  }

  #[test]
  fn timestamps_sort_lexically() {
    let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn location_columns_fill_one_half() {
    let cols = LocationColumns::from(Some(Location::Structured {
      state_code: Some("CA".into()),
      city_id:    Some(1),
    }));
    assert_eq!(cols.country_code.as_deref(), Some("US"));
    assert!(cols.country.is_none() && cols.city.is_none());

    let cols = LocationColumns::from(Some(Location::FreeText {
      country: Some("France".into()),
      state:   None,
      city:    Some("Paris".into()),
    }));
    assert!(cols.country_code.is_none() && cols.city_id.is_none());
    assert_eq!(cols.city.as_deref(), Some("Paris"));
  }
}
