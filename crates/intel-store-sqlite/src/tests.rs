//! Integration tests for `SqliteStore` against an in-memory database.

use intel_core::{
  ErrorKind,
  activity::HistoryAction,
  company::{CompanyPatch, NewCompany},
  contact::{ContactPatch, NewContact, Priority},
  location::{CityQuery, Country, LocationInput, NewCity, State},
  note::{NewNote, NotePatch, NoteScope},
  query::{CompanyQuery, ContactQuery, Pagination, PriorityFilter, StatusFilter},
  store::IntelStore,
  user::{NewSession, NewUser, Role, User},
};

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn kind(err: &Error) -> Option<ErrorKind> {
  match err {
    Error::Core(e) => Some(e.kind()),
    _ => None,
  }
}

async fn user(s: &SqliteStore, name: &str, role: Role) -> User {
  s.create_user(NewUser {
    name: name.into(),
    last_name: None,
    email: format!("{}@intel.test", name.to_lowercase()),
    role,
    password_hash: None,
  })
  .await
  .unwrap()
}

/// US / California / San Francisco, returning the city id.
async fn seed_california(s: &SqliteStore) -> i64 {
  s.add_country(Country { code: "US".into(), name: "United States".into() })
    .await
    .unwrap();
  s.add_state(State { code: "CA".into(), name: "California".into(), country_code: "US".into() })
    .await
    .unwrap();
  s.add_city(NewCity {
    city_ascii: Some("san francisco".into()),
    ..NewCity::new("San Francisco", "CA")
  })
  .await
  .unwrap()
  .id
}

fn query(page: u32, limit: u32) -> ContactQuery {
  ContactQuery { pagination: Pagination::new(page, limit), ..Default::default() }
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_get_round_trips_with_defaults() {
  let s = store().await;
  let created = s
    .create_contact(
      NewContact {
        email: Some("alice@example.com".into()),
        biography: Some("Producer".into()),
        ..NewContact::new("Alice", "Johnson")
      },
      None,
    )
    .await
    .unwrap();

  let fetched = s.get_contact(created.contact.id).await.unwrap().unwrap();
  let c = &fetched.contact;
  assert_eq!(c.first_name, "Alice");
  assert_eq!(c.last_name, "Johnson");
  assert_eq!(c.email.as_deref(), Some("alice@example.com"));
  assert_eq!(c.biography.as_deref(), Some("Producer"));
  assert_eq!(c.priority, Priority::None);
  assert!(!c.seen_film);
  assert!(!c.doc_branch_member);
  assert!(c.is_active);
  assert!(c.location.is_none());
  assert!(fetched.all_assignments.is_empty());

  let history = s.contact_history(c.id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].action, HistoryAction::Created);
}

#[tokio::test]
async fn get_missing_contact_returns_none() {
  let s = store().await;
  assert!(s.get_contact(999).await.unwrap().is_none());
}

#[tokio::test]
async fn structured_location_joins_reference_names() {
  let s = store().await;
  let city_id = seed_california(&s).await;

  let created = s
    .create_contact(
      NewContact {
        location: Some(LocationInput {
          country_code: Some("US".into()),
          state_code: Some("CA".into()),
          city_id: Some(city_id),
          ..Default::default()
        }),
        ..NewContact::new("Alice", "Johnson")
      },
      None,
    )
    .await
    .unwrap();

  let fetched = s.get_contact(created.contact.id).await.unwrap().unwrap();
  let location = fetched.contact.location.unwrap();
  assert_eq!(location.city_name.as_deref(), Some("San Francisco"));
  assert_eq!(location.state_name.as_deref(), Some("California"));
  assert_eq!(location.country_name.as_deref(), Some("United States"));
  assert!(location.city.is_none());
}

#[tokio::test]
async fn free_text_location_clears_structured_columns() {
  let s = store().await;
  let created = s
    .create_contact(
      NewContact {
        location: Some(LocationInput {
          country: Some("France".into()),
          city: Some("Paris".into()),
          state_code: Some("CA".into()),
          ..Default::default()
        }),
        ..NewContact::new("Bruno", "Lefèvre")
      },
      None,
    )
    .await
    .unwrap();

  let location = created.contact.location.unwrap();
  assert_eq!(location.country.as_deref(), Some("France"));
  assert_eq!(location.city.as_deref(), Some("Paris"));
  assert!(location.country_code.is_none());
  assert!(location.state_code.is_none());
}

#[tokio::test]
async fn city_from_another_state_is_rejected() {
  let s = store().await;
  let city_id = seed_california(&s).await;
  s.add_state(State { code: "NY".into(), name: "New York".into(), country_code: "US".into() })
    .await
    .unwrap();

  let err = s
    .create_contact(
      NewContact {
        location: Some(LocationInput {
          country_code: Some("US".into()),
          state_code: Some("NY".into()),
          city_id: Some(city_id),
          ..Default::default()
        }),
        ..NewContact::new("Alice", "Johnson")
      },
      None,
    )
    .await
    .unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Invalid));

  // Nothing was written.
  assert_eq!(s.list_contacts(&ContactQuery::default()).await.unwrap().pagination.total, 0);
}

#[tokio::test]
async fn sparse_update_leaves_other_fields() {
  let s = store().await;
  let created = s
    .create_contact(
      NewContact { email: Some("a@example.com".into()), ..NewContact::new("Alice", "Johnson") },
      None,
    )
    .await
    .unwrap();
  let id = created.contact.id;

  let patch: ContactPatch = serde_json::from_str(r#"{"priority":"HIGH"}"#).unwrap();
  let updated = s.update_contact(id, patch, None).await.unwrap();
  assert_eq!(updated.contact.priority, Priority::High);
  assert_eq!(updated.contact.first_name, "Alice");
  assert_eq!(updated.contact.email.as_deref(), Some("a@example.com"));

  let history = s.contact_history(id).await.unwrap();
  assert_eq!(history[0].action, HistoryAction::Updated);
  assert_eq!(history[0].changes, Some(serde_json::json!({ "priority": "HIGH" })));
}

#[tokio::test]
async fn explicit_null_clears_a_field() {
  let s = store().await;
  let created = s
    .create_contact(
      NewContact { email: Some("a@example.com".into()), ..NewContact::new("Alice", "Johnson") },
      None,
    )
    .await
    .unwrap();

  let patch: ContactPatch = serde_json::from_str(r#"{"email":null}"#).unwrap();
  let updated = s.update_contact(created.contact.id, patch, None).await.unwrap();
  assert!(updated.contact.email.is_none());
}

#[tokio::test]
async fn update_missing_contact_is_not_found() {
  let s = store().await;
  let patch = ContactPatch { priority: Some(Priority::Low), ..Default::default() };
  let err = s.update_contact(42, patch, None).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn deactivate_is_soft_and_audited() {
  let s = store().await;
  let actor = user(&s, "Morgan", Role::Admin).await;
  let created = s.create_contact(NewContact::new("Alice", "Johnson"), None).await.unwrap();
  let id = created.contact.id;

  let gone = s.deactivate_contact(id, None, Some(actor.id)).await.unwrap();
  assert!(!gone.contact.is_active);
  assert_eq!(gone.contact.inactive_reason.as_deref(), Some("No reason provided"));
  assert!(gone.contact.inactive_at.is_some());

  // Still fetchable by id.
  let fetched = s.get_contact(id).await.unwrap().unwrap();
  assert!(!fetched.contact.is_active);

  let history = s.contact_history(id).await.unwrap();
  let entry = history
    .iter()
    .find(|h| h.action == HistoryAction::Deactivated)
    .unwrap();
  assert_eq!(entry.user_id, Some(actor.id));
  assert_eq!(entry.reason.as_deref(), Some("No reason provided"));
}

#[tokio::test]
async fn reactivation_clears_reason() {
  let s = store().await;
  let id = s
    .create_contact(NewContact::new("Alice", "Johnson"), None)
    .await
    .unwrap()
    .contact
    .id;
  s.deactivate_contact(id, Some("moved away".into()), None).await.unwrap();

  let patch = ContactPatch { is_active: Some(true), ..Default::default() };
  let back = s.update_contact(id, patch, None).await.unwrap();
  assert!(back.contact.is_active);
  assert!(back.contact.inactive_reason.is_none());
  assert!(back.contact.inactive_at.is_none());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn total_is_independent_of_page() {
  let s = store().await;
  for i in 0..7 {
    s.create_contact(NewContact::new(format!("Person{i}"), "Doe"), None)
      .await
      .unwrap();
  }

  for (page, limit, rows) in [(1, 3, 3), (2, 3, 3), (3, 3, 1), (4, 3, 0), (1, 100, 7)] {
    let result = s.list_contacts(&query(page, limit)).await.unwrap();
    assert_eq!(result.pagination.total, 7, "page {page} limit {limit}");
    assert_eq!(result.data.len(), rows, "page {page} limit {limit}");
  }

  let last = s.list_contacts(&query(3, 3)).await.unwrap().pagination;
  assert_eq!(last.total_pages, 3);
  assert!(!last.has_next);
  assert!(last.has_prev);
}

#[tokio::test]
async fn newest_first_with_id_tie_break() {
  let s = store().await;
  let mut ids = Vec::new();
  for name in ["A", "B", "C"] {
    ids.push(s.create_contact(NewContact::new(name, "X"), None).await.unwrap().contact.id);
  }
  // Force identical timestamps.
  s.conn
    .call(|conn| {
      conn.execute("UPDATE contacts SET created_at = '2024-01-01T00:00:00.000000Z'", [])?;
      Ok(())
    })
    .await
    .unwrap();

  let listed: Vec<i64> = s
    .list_contacts(&ContactQuery::default())
    .await
    .unwrap()
    .data
    .iter()
    .map(|c| c.contact.id)
    .collect();
  ids.reverse();
  assert_eq!(listed, ids);
}

#[tokio::test]
async fn priority_filter_only_returns_that_priority() {
  let s = store().await;
  for (name, priority) in [
    ("A", Priority::High),
    ("B", Priority::Low),
    ("C", Priority::High),
    ("D", Priority::None),
  ] {
    s.create_contact(NewContact { priority, ..NewContact::new(name, "X") }, None)
      .await
      .unwrap();
  }

  let q = ContactQuery { priority: PriorityFilter::Only(Priority::High), ..Default::default() };
  let page = s.list_contacts(&q).await.unwrap();
  assert_eq!(page.pagination.total, 2);
  assert!(page.data.iter().all(|c| c.contact.priority == Priority::High));
}

#[tokio::test]
async fn search_is_case_insensitive_and_literal() {
  let s = store().await;
  for name in ["Alice", "alina", "Bob", "50%Off"] {
    s.create_contact(NewContact::new(name, "X"), None).await.unwrap();
  }

  let q = ContactQuery { search: Some("ALI".into()), ..Default::default() };
  assert_eq!(s.list_contacts(&q).await.unwrap().pagination.total, 2);

  let q = ContactQuery { search: Some("%".into()), ..Default::default() };
  let page = s.list_contacts(&q).await.unwrap();
  assert_eq!(page.pagination.total, 1);
  assert_eq!(page.data[0].contact.first_name, "50%Off");
}

#[tokio::test]
async fn status_filter_splits_active_and_inactive() {
  let s = store().await;
  let a = s.create_contact(NewContact::new("A", "X"), None).await.unwrap().contact.id;
  s.create_contact(NewContact::new("B", "X"), None).await.unwrap();
  s.deactivate_contact(a, None, None).await.unwrap();

  let active = ContactQuery { status: StatusFilter::Active, ..Default::default() };
  let inactive = ContactQuery { status: StatusFilter::Inactive, ..Default::default() };
  assert_eq!(s.list_contacts(&active).await.unwrap().pagination.total, 1);
  assert_eq!(s.list_contacts(&inactive).await.unwrap().pagination.total, 1);
  assert_eq!(s.list_contacts(&ContactQuery::default()).await.unwrap().pagination.total, 2);
}

#[tokio::test]
async fn first_assignment_is_lowest_id_and_rows_are_not_duplicated() {
  let s = store().await;
  let first = user(&s, "Sam", Role::Editor).await;
  let second = user(&s, "Morgan", Role::Admin).await;
  let id = s.create_contact(NewContact::new("Alice", "X"), None).await.unwrap().contact.id;
  s.create_contact(NewContact::new("Bob", "X"), None).await.unwrap();

  assert!(s.assign_contact(id, first.id).await.unwrap());
  assert!(s.assign_contact(id, second.id).await.unwrap());
  // Re-assigning is ignored.
  assert!(!s.assign_contact(id, first.id).await.unwrap());

  let page = s.list_contacts(&ContactQuery::default()).await.unwrap();
  assert_eq!(page.data.len(), 2);
  assert_eq!(page.pagination.total, 2);

  let alice = page.data.iter().find(|c| c.contact.id == id).unwrap();
  assert_eq!(alice.assigned_to, Some(first.id));
  assert_eq!(alice.assigned_to_name.as_deref(), Some("Sam"));
  let all: Vec<i64> = alice.all_assignments.iter().map(|a| a.user_id).collect();
  assert_eq!(all, vec![first.id, second.id]);

  let bob = page.data.iter().find(|c| c.contact.id != id).unwrap();
  assert!(bob.assigned_to.is_none());
  assert!(bob.all_assignments.is_empty());

  assert!(s.unassign_contact(id, first.id).await.unwrap());
  let alice = s.get_contact(id).await.unwrap().unwrap();
  assert_eq!(alice.assigned_to, Some(second.id));
}

#[tokio::test]
async fn assigning_unknown_user_is_not_found() {
  let s = store().await;
  let id = s.create_contact(NewContact::new("Alice", "X"), None).await.unwrap().contact.id;
  let err = s.assign_contact(id, 77).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

// ─── Companies ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn company_names_are_unique_case_insensitively() {
  let s = store().await;
  s.create_company(NewCompany::named("Northlight")).await.unwrap();
  let err = s.create_company(NewCompany::named("  northLIGHT ")).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Conflict));

  let other = s.create_company(NewCompany::named("Harbor")).await.unwrap();
  let rename = CompanyPatch { name: Some("NORTHLIGHT".into()), ..Default::default() };
  let err = s.update_company(other.company.id, rename).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Conflict));
}

#[tokio::test]
async fn companies_list_alphabetically_with_counts() {
  let s = store().await;
  let zed = s.create_company(NewCompany::named("zed films")).await.unwrap();
  s.create_company(NewCompany::named("Acme")).await.unwrap();
  s.create_company(NewCompany::named("bravo")).await.unwrap();
  s.create_contact(
    NewContact { company_id: Some(zed.company.id), ..NewContact::new("A", "X") },
    None,
  )
  .await
  .unwrap();

  let page = s.list_companies(&CompanyQuery::default()).await.unwrap();
  let names: Vec<&str> = page.data.iter().map(|c| c.company.name.as_str()).collect();
  assert_eq!(names, vec!["Acme", "bravo", "zed films"]);
  assert_eq!(page.data[2].contact_count, 1);

  let q = CompanyQuery { search: Some("BRA".into()), ..Default::default() };
  assert_eq!(s.list_companies(&q).await.unwrap().pagination.total, 1);
}

#[tokio::test]
async fn company_delete_is_guarded_by_contacts() {
  let s = store().await;
  let company = s.create_company(NewCompany::named("Northlight")).await.unwrap();
  let id = company.company.id;
  let contact = s
    .create_contact(NewContact { company_id: Some(id), ..NewContact::new("A", "X") }, None)
    .await
    .unwrap();

  let err = s.delete_company(id).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Conflict));
  assert!(s.get_company(id).await.unwrap().is_some());

  let detach: ContactPatch = serde_json::from_str(r#"{"companyId":null}"#).unwrap();
  s.update_contact(contact.contact.id, detach, None).await.unwrap();

  s.delete_company(id).await.unwrap();
  assert!(s.get_company(id).await.unwrap().is_none());
}

#[tokio::test]
async fn contact_with_unknown_company_is_rejected() {
  let s = store().await;
  let err = s
    .create_contact(NewContact { company_id: Some(5), ..NewContact::new("A", "X") }, None)
    .await
    .unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn company_headquarters_resolves_names() {
  let s = store().await;
  let city_id = seed_california(&s).await;
  let company = s
    .create_company(NewCompany {
      country_code: Some("us".into()),
      state_code: Some("ca".into()),
      city_id: Some(city_id),
      website: Some("https://northlight.example".into()),
      industry: Some("Film".into()),
      ..NewCompany::named("Northlight")
    })
    .await
    .unwrap();
  let stored = s.get_company(company.company.id).await.unwrap().unwrap();
  assert_eq!(stored.company.name, "Northlight");
  assert_eq!(stored.company.website.as_deref(), Some("https://northlight.example"));
  assert_eq!(stored.company.industry.as_deref(), Some("Film"));
  assert!(stored.company.linkedin_url.is_none());
  assert_eq!(company.city_name.as_deref(), Some("San Francisco"));
  assert_eq!(company.state_name.as_deref(), Some("California"));
}

// ─── Notes ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn only_editors_and_admins_create_notes() {
  let s = store().await;
  let viewer = user(&s, "Vic", Role::Viewer).await;
  let editor = user(&s, "Sam", Role::Editor).await;
  let id = s.create_contact(NewContact::new("A", "X"), None).await.unwrap().contact.id;

  let note = NewNote { content: "hello".into(), scope: NoteScope::General };
  let err = s.create_note(id, viewer, note.clone()).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Forbidden));

  let created = s.create_note(id, editor.clone(), note).await.unwrap();
  assert_eq!(created.user_id, editor.id);
  assert_eq!(created.author_name, "Sam");
  assert!(!created.is_edited);
}

#[tokio::test]
async fn only_author_or_admin_modify_notes() {
  let s = store().await;
  let author = user(&s, "Sam", Role::Editor).await;
  let other = user(&s, "Kim", Role::Editor).await;
  let admin = user(&s, "Morgan", Role::Admin).await;
  let id = s.create_contact(NewContact::new("A", "X"), None).await.unwrap().contact.id;
  let note = s
    .create_note(id, author.clone(), NewNote { content: "original".into(), scope: NoteScope::Private })
    .await
    .unwrap();

  let edit = NotePatch { content: Some("hijacked".into()), scope: None };
  let err = s.update_note(id, note.id, other.clone(), edit).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Forbidden));
  assert_eq!(s.list_notes(id).await.unwrap()[0].content, "original");

  let err = s.delete_note(id, note.id, other).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Forbidden));

  let edit = NotePatch { content: Some("revised".into()), scope: None };
  let edited = s.update_note(id, note.id, author, edit).await.unwrap();
  assert!(edited.is_edited);
  assert!(edited.edited_at.is_some());
  assert_eq!(edited.scope, NoteScope::Private);

  s.delete_note(id, note.id, admin).await.unwrap();
  assert!(s.list_notes(id).await.unwrap().is_empty());
}

#[tokio::test]
async fn note_on_other_contact_is_not_found() {
  let s = store().await;
  let editor = user(&s, "Sam", Role::Editor).await;
  let a = s.create_contact(NewContact::new("A", "X"), None).await.unwrap().contact.id;
  let b = s.create_contact(NewContact::new("B", "X"), None).await.unwrap().contact.id;
  let note = s
    .create_note(a, editor.clone(), NewNote { content: "x".into(), scope: NoteScope::General })
    .await
    .unwrap();

  let err = s.delete_note(b, note.id, editor).await.unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::NotFound));
}

// ─── Users, sessions & reference data ────────────────────────────────────────

#[tokio::test]
async fn duplicate_user_email_conflicts() {
  let s = store().await;
  user(&s, "Sam", Role::Editor).await;
  let err = s
    .create_user(NewUser {
      name:          "Other".into(),
      last_name:     None,
      email:         "SAM@intel.test".into(),
      role:          Role::Viewer,
      password_hash: None,
    })
    .await
    .unwrap_err();
  assert_eq!(kind(&err), Some(ErrorKind::Conflict));
}

#[tokio::test]
async fn sessions_expire() {
  let s = store().await;
  let sam = user(&s, "Sam", Role::Editor).await;
  let now = chrono::Utc::now();
  s.create_session(NewSession {
    token_hash: "abc".into(),
    user_id:    sam.id,
    created_at: now,
    expires_at: now + chrono::Duration::hours(1),
  })
  .await
  .unwrap();

  assert_eq!(s.session_user("abc".into(), now).await.unwrap(), Some(sam));
  assert!(s
    .session_user("abc".into(), now + chrono::Duration::hours(2))
    .await
    .unwrap()
    .is_none());

  assert!(s.delete_session("abc".into()).await.unwrap());
  assert!(s.session_user("abc".into(), now).await.unwrap().is_none());
}

#[tokio::test]
async fn login_purges_expired_sessions() {
  let s = store().await;
  let sam = user(&s, "Sam", Role::Editor).await;
  let now = chrono::Utc::now();
  let session = |token: &str, created_at: chrono::DateTime<chrono::Utc>| NewSession {
    token_hash: token.into(),
    user_id: sam.id,
    created_at,
    expires_at: created_at + chrono::Duration::hours(1),
  };
  s.create_session(session("old", now)).await.unwrap();
  s.create_session(session("live", now + chrono::Duration::minutes(30)))
    .await
    .unwrap();

  // Logging in after "old" expired removes its row, so it no longer
  // resolves even at a time it would still have been valid.
  s.create_session(session("new", now + chrono::Duration::hours(2)))
    .await
    .unwrap();
  assert!(s.session_user("old".into(), now).await.unwrap().is_none());
  assert!(!s.delete_session("old".into()).await.unwrap());

  // "live" expired at now+90m, also before the latest login.
  assert!(!s.delete_session("live".into()).await.unwrap());
  assert_eq!(
    s.session_user("new".into(), now + chrono::Duration::hours(2))
      .await
      .unwrap(),
    Some(sam)
  );
}

#[tokio::test]
async fn cities_match_on_folded_name_and_state() {
  let s = store().await;
  seed_california(&s).await;
  let again = s.add_city(NewCity::new("Säo José", "CA")).await.unwrap();
  let same = s.add_city(NewCity::new("SAO JOSE", "ca")).await.unwrap();
  assert_eq!(again.id, same.id);
  assert_eq!(same.city_ascii, "sao jose");

  let found = s.find_city("san francisco".into(), "CA".into()).await.unwrap().unwrap();
  assert_eq!(found.city, "San Francisco");

  let hits = s
    .search_cities(CityQuery { state_code: "CA".into(), prefix: Some("sa".into()), limit: 10 })
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);
}

#[tokio::test]
async fn backup_writes_a_snapshot() {
  let s = store().await;
  s.create_contact(NewContact::new("Alice", "X"), None).await.unwrap();

  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("backup.sqlite");
  s.backup_to(&path).await.unwrap();

  let copy = SqliteStore::open(&path).await.unwrap();
  assert_eq!(copy.list_contacts(&ContactQuery::default()).await.unwrap().pagination.total, 1);
}
