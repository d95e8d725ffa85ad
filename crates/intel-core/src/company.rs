//! Companies, the organisations contacts can belong to.
//!
//! Company names are unique after trimming, compared case-insensitively.
//! A company can only be deleted once no contact references it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result, patch::present};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
  pub id:           i64,
  pub name:         String,
  pub website:      Option<String>,
  pub linkedin_url: Option<String>,
  pub industry:     Option<String>,
  /// Headcount bracket, e.g. `"11-50"`.
  pub size:         Option<String>,
  pub description:  Option<String>,
  pub logo_url:     Option<String>,
  pub country_code: Option<String>,
  pub state_code:   Option<String>,
  pub city_id:      Option<i64>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// A company with its headquarters names joined in and the number of
/// contacts that reference it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyView {
  #[serde(flatten)]
  pub company:       Company,
  pub country_name:  Option<String>,
  pub state_name:    Option<String>,
  pub city_name:     Option<String>,
  pub contact_count: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCompany {
  pub name:         String,
  #[serde(default)]
  pub website:      Option<String>,
  #[serde(default)]
  pub linkedin_url: Option<String>,
  #[serde(default)]
  pub industry:     Option<String>,
  #[serde(default)]
  pub size:         Option<String>,
  #[serde(default)]
  pub description:  Option<String>,
  #[serde(default)]
  pub logo_url:     Option<String>,
  #[serde(default)]
  pub country_code: Option<String>,
  #[serde(default)]
  pub state_code:   Option<String>,
  #[serde(default)]
  pub city_id:      Option<i64>,
}

impl NewCompany {
  pub fn named(name: impl Into<String>) -> Self {
    Self { name: name.into(), ..Default::default() }
  }

  pub fn validate(mut self) -> Result<Self> {
    self.name = company_name(&self.name)?;
    self.country_code = self.country_code.map(|c| c.trim().to_uppercase());
    self.state_code = self.state_code.map(|s| s.trim().to_uppercase());
    if self.city_id.is_some() && self.state_code.is_none() {
      return Err(Error::Invalid("stateCode is required when cityId is given".into()));
    }
    Ok(self)
  }
}

/// Sparse company update; see [`crate::contact::ContactPatch`] for the
/// absent-versus-null convention.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyPatch {
  #[serde(default)]
  pub name:         Option<String>,
  #[serde(default, deserialize_with = "present")]
  pub website:      Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub linkedin_url: Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub industry:     Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub size:         Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub description:  Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub logo_url:     Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub country_code: Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub state_code:   Option<Option<String>>,
  #[serde(default, deserialize_with = "present")]
  pub city_id:      Option<Option<i64>>,
}

impl CompanyPatch {
  pub fn validate(mut self) -> Result<Self> {
    if let Some(name) = &self.name {
      self.name = Some(company_name(name)?);
    }
    self.country_code = self
      .country_code
      .map(|c| c.map(|c| c.trim().to_uppercase()));
    self.state_code = self.state_code.map(|s| s.map(|s| s.trim().to_uppercase()));
    Ok(self)
  }
}

fn company_name(name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::Invalid("name is required".into()));
  }
  Ok(trimmed.to_owned())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn names_are_trimmed() {
    let c = NewCompany::named("  Acme Films ").validate().unwrap();
    assert_eq!(c.name, "Acme Films");
  }

  #[test]
  fn blank_names_are_rejected() {
    assert!(NewCompany::named("   ").validate().is_err());
    let patch = CompanyPatch { name: Some("".into()), ..Default::default() };
    assert!(patch.validate().is_err());
  }

  #[test]
  fn headquarters_city_needs_state() {
    let c = NewCompany { city_id: Some(3), ..NewCompany::named("Acme") };
    assert!(matches!(c.validate(), Err(Error::Invalid(_))));
  }
}
