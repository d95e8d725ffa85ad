//! Contacts: the person records at the centre of the admin panel.
//!
//! Contacts are never hard-deleted. Deactivation flips `is_active` and
//! records a reason; every create, update and deactivation appends a
//! [`HistoryEntry`](crate::activity::HistoryEntry).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  Error, Result,
  location::{LocationInput, ResolvedLocation},
  patch::present,
};

/// Reason recorded when a deactivation request supplies none.
pub const DEFAULT_INACTIVE_REASON: &str = "No reason provided";

// ─── Priority ────────────────────────────────────────────────────────────────

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  AsRefStr,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum Priority {
  High,
  Medium,
  Low,
  #[default]
  None,
}

// ─── Stored contact ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:                i64,
  pub first_name:        String,
  pub last_name:         String,
  pub email:             Option<String>,
  pub email_secondary:   Option<String>,
  pub linkedin_url:      Option<String>,
  pub facebook_url:      Option<String>,
  pub instagram_url:     Option<String>,
  pub imdb_url:          Option<String>,
  pub wikipedia_url:     Option<String>,
  pub biography:         Option<String>,
  pub priority:          Priority,
  pub seen_film:         bool,
  pub doc_branch_member: bool,
  pub location:          Option<ResolvedLocation>,
  pub is_active:         bool,
  pub inactive_reason:   Option<String>,
  pub inactive_at:       Option<DateTime<Utc>>,
  pub company_id:        Option<i64>,
  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
}

/// One assignee of a contact, as shown in multi-assignment UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeSummary {
  pub user_id:   i64,
  pub name:      String,
  pub last_name: Option<String>,
}

/// The denormalised contact shape returned by listings and single fetches.
///
/// `assigned_to*` is the contact's first assignment (lowest assignment id);
/// `all_assignments` lists every assignee in assignment order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactView {
  #[serde(flatten)]
  pub contact:               Contact,
  pub company_name:          Option<String>,
  pub company_website:       Option<String>,
  pub company_industry:      Option<String>,
  pub assigned_to:           Option<i64>,
  pub assigned_to_name:      Option<String>,
  pub assigned_to_last_name: Option<String>,
  pub all_assignments:       Vec<AssigneeSummary>,
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::IntelStore::create_contact`]. Omitted flags and
/// priority take their defaults (`NONE`, `false`, `false`); new contacts are
/// always active.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContact {
  pub first_name:        String,
  pub last_name:         String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:             Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email_secondary:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub linkedin_url:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub facebook_url:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub instagram_url:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub imdb_url:          Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub wikipedia_url:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub biography:         Option<String>,
  #[serde(default)]
  pub priority:          Priority,
  #[serde(default)]
  pub seen_film:         bool,
  #[serde(default)]
  pub doc_branch_member: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub location:          Option<LocationInput>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub company_id:        Option<i64>,
}

impl NewContact {
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self { first_name: first_name.into(), last_name: last_name.into(), ..Default::default() }
  }

  /// Trim names and reject input the store must never see.
  pub fn validate(mut self) -> Result<Self> {
    self.first_name = required_name("firstName", &self.first_name)?;
    self.last_name = required_name("lastName", &self.last_name)?;
    validate_email("email", self.email.as_deref())?;
    validate_email("emailSecondary", self.email_secondary.as_deref())?;
    Ok(self)
  }
}

// ─── ContactPatch ────────────────────────────────────────────────────────────

/// A sparse update. Only keys present in the input are written; an absent
/// key leaves the column alone while an explicit `null` clears it.
///
/// Serialising a patch reproduces exactly the keys that were supplied, which
/// is what the history log records.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ContactPatch {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub first_name:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub last_name:         Option<String>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub email:             Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub email_secondary:   Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub linkedin_url:      Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub facebook_url:      Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub instagram_url:     Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub imdb_url:          Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub wikipedia_url:     Option<Option<String>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub biography:         Option<Option<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub priority:          Option<Priority>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub seen_film:         Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doc_branch_member: Option<bool>,
  /// `null` clears the location entirely.
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub location:          Option<Option<LocationInput>>,
  #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
  pub company_id:        Option<Option<i64>>,
  /// `true` reactivates a contact and clears its inactive reason.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_active:         Option<bool>,
}

impl ContactPatch {
  pub fn is_empty(&self) -> bool {
    self.first_name.is_none()
      && self.last_name.is_none()
      && self.email.is_none()
      && self.email_secondary.is_none()
      && self.linkedin_url.is_none()
      && self.facebook_url.is_none()
      && self.instagram_url.is_none()
      && self.imdb_url.is_none()
      && self.wikipedia_url.is_none()
      && self.biography.is_none()
      && self.priority.is_none()
      && self.seen_film.is_none()
      && self.doc_branch_member.is_none()
      && self.location.is_none()
      && self.company_id.is_none()
      && self.is_active.is_none()
  }

  pub fn validate(mut self) -> Result<Self> {
    if self.is_empty() {
      return Err(Error::Invalid("no fields to update".into()));
    }
    if let Some(name) = &self.first_name {
      self.first_name = Some(required_name("firstName", name)?);
    }
    if let Some(name) = &self.last_name {
      self.last_name = Some(required_name("lastName", name)?);
    }
    if let Some(email) = &self.email {
      validate_email("email", email.as_deref())?;
    }
    if let Some(email) = &self.email_secondary {
      validate_email("emailSecondary", email.as_deref())?;
    }
    Ok(self)
  }
}

// ─── Validation helpers ──────────────────────────────────────────────────────

fn required_name(field: &str, value: &str) -> Result<String> {
  let trimmed = value.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid(format!("{field} is required")));
  }
  Ok(trimmed.to_owned())
}

fn validate_email(field: &str, value: Option<&str>) -> Result<()> {
  match value {
    None => Ok(()),
    Some(v) if v.is_empty() => Ok(()),
    Some(v) => {
      let valid = v
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
      if valid {
        Ok(())
      } else {
        Err(Error::Invalid(format!("{field} is not a valid email address")))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_uses_uppercase_tags() {
    assert_eq!(serde_json::to_string(&Priority::High).unwrap(), "\"HIGH\"");
    assert_eq!("NONE".parse::<Priority>().unwrap(), Priority::None);
    assert!("high".parse::<Priority>().is_err());
  }

  #[test]
  fn patch_distinguishes_absent_from_null() {
    let patch: ContactPatch =
      serde_json::from_str(r#"{"priority":"HIGH","biography":null}"#).unwrap();
    assert_eq!(patch.priority, Some(Priority::High));
    assert_eq!(patch.biography, Some(None));
    assert_eq!(patch.email, None);
    assert_eq!(patch.first_name, None);
  }

  #[test]
  fn patch_serialises_only_supplied_keys() {
    let patch: ContactPatch =
      serde_json::from_str(r#"{"priority":"LOW","email":null}"#).unwrap();
    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(json, serde_json::json!({ "priority": "LOW", "email": null }));
  }

  #[test]
  fn patch_rejects_unknown_keys() {
    assert!(serde_json::from_str::<ContactPatch>(r#"{"nickname":"Al"}"#).is_err());
  }

  #[test]
  fn empty_patch_is_invalid() {
    assert!(matches!(ContactPatch::default().validate(), Err(Error::Invalid(_))));
  }

  #[test]
  fn new_contact_defaults() {
    let c: NewContact =
      serde_json::from_str(r#"{"firstName":"Alice","lastName":"Johnson"}"#).unwrap();
    assert_eq!(c.priority, Priority::None);
    assert!(!c.seen_film);
    assert!(!c.doc_branch_member);
  }

  #[test]
  fn new_contact_validation_trims_and_checks_email() {
    let c = NewContact { email: Some("alice@example.com".into()), ..NewContact::new(" Alice ", "Johnson") };
    assert_eq!(c.validate().unwrap().first_name, "Alice");

    let bad = NewContact { email: Some("not-an-email".into()), ..NewContact::new("A", "B") };
    assert!(bad.validate().is_err());

    assert!(NewContact::new("  ", "B").validate().is_err());
  }
}
