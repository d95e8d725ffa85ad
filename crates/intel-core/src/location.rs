//! Geographic reference data and the contact/company location model.
//!
//! Countries, states and cities are static reference tables. A contact is
//! located either structurally (US only: country + state code + city id) or
//! by free text for everywhere else, never both.

use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{Error, Result};

/// The only country whose locations are stored as structured references.
pub const STRUCTURED_COUNTRY: &str = "US";

// ─── Reference data ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
  /// ISO 3166-1 alpha-2 code.
  pub code: String,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
  pub code:         String,
  pub name:         String,
  pub country_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
  pub id:          i64,
  /// Display name, diacritics intact.
  pub city:        String,
  /// Folded name used for matching; see [`ascii_fold`].
  pub city_ascii:  String,
  pub state_code:  String,
  pub county_name: Option<String>,
  pub lat:         Option<f64>,
  pub lng:         Option<f64>,
  pub population:  Option<i64>,
  pub density:     Option<f64>,
  pub timezone:    Option<String>,
}

/// Input to [`crate::store::IntelStore::add_city`]. `city_ascii` is derived
/// from `city` when omitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCity {
  pub city:        String,
  pub city_ascii:  Option<String>,
  pub state_code:  String,
  pub county_name: Option<String>,
  pub lat:         Option<f64>,
  pub lng:         Option<f64>,
  pub population:  Option<i64>,
  pub density:     Option<f64>,
  pub timezone:    Option<String>,
}

impl NewCity {
  pub fn new(city: impl Into<String>, state_code: impl Into<String>) -> Self {
    Self { city: city.into(), state_code: state_code.into(), ..Default::default() }
  }

  /// The matching key this city will be stored under.
  pub fn matching_name(&self) -> String {
    match &self.city_ascii {
      Some(ascii) if !ascii.trim().is_empty() => ascii_fold(ascii),
      _ => ascii_fold(&self.city),
    }
  }
}

/// Parameters for [`crate::store::IntelStore::search_cities`].
#[derive(Debug, Clone)]
pub struct CityQuery {
  pub state_code: String,
  /// Already folded with [`ascii_fold`]; matched as a prefix.
  pub prefix:     Option<String>,
  pub limit:      u32,
}

/// Strip diacritics, trim, and lower-case. `"São Paulo"` → `"sao paulo"`.
///
/// Every city lookup compares folded names so spreadsheet imports match
/// regardless of their encoding of accented characters.
pub fn ascii_fold(input: &str) -> String {
  input
    .trim()
    .nfd()
    .filter(|c| !is_combining_mark(*c))
    .collect::<String>()
    .to_lowercase()
}

// ─── Location input ──────────────────────────────────────────────────────────

/// Location as submitted by clients. Which half is kept depends on the
/// country; see [`LocationInput::normalize`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationInput {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country_code: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state_code:   Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city_id:      Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub country:      Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub state:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub city:         Option<String>,
}

/// A validated location: exactly one representation is populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
  Structured {
    state_code: Option<String>,
    city_id:    Option<i64>,
  },
  FreeText {
    country: Option<String>,
    state:   Option<String>,
    city:    Option<String>,
  },
}

fn non_empty(s: Option<String>) -> Option<String> {
  s.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty())
}

impl LocationInput {
  /// Collapse the input into a [`Location`], or `None` if nothing was given.
  ///
  /// A country of `"US"` (by code or by free-text name) selects the
  /// structured form and discards free-text parts; anything else selects
  /// free text and discards the structured parts.
  pub fn normalize(self) -> Result<Option<Location>> {
    let country_code = non_empty(self.country_code).map(|c| c.to_uppercase());
    let country = non_empty(self.country);

    let is_us = country_code.as_deref() == Some(STRUCTURED_COUNTRY)
      || country
        .as_deref()
        .is_some_and(|c| c.eq_ignore_ascii_case(STRUCTURED_COUNTRY));

    if is_us {
      let state_code = non_empty(self.state_code).map(|s| s.to_uppercase());
      if self.city_id.is_some() && state_code.is_none() {
        return Err(Error::Invalid(
          "stateCode is required when cityId is given".into(),
        ));
      }
      return Ok(Some(Location::Structured { state_code, city_id: self.city_id }));
    }

    let country = country.or(country_code);
    let state = non_empty(self.state);
    let city = non_empty(self.city);
    if country.is_none() && state.is_none() && city.is_none() {
      if self.city_id.is_some() || self.state_code.is_some() {
        return Err(Error::Invalid(
          "structured locations require countryCode \"US\"".into(),
        ));
      }
      return Ok(None);
    }
    Ok(Some(Location::FreeText { country, state, city }))
  }
}

// ─── Resolved location ───────────────────────────────────────────────────────

/// A stored location with reference names joined in. Structured fields and
/// free-text fields are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedLocation {
  pub country_code: Option<String>,
  pub state_code:   Option<String>,
  pub city_id:      Option<i64>,
  pub country_name: Option<String>,
  pub state_name:   Option<String>,
  pub city_name:    Option<String>,
  pub country:      Option<String>,
  pub state:        Option<String>,
  pub city:         Option<String>,
}

impl ResolvedLocation {
  pub fn is_empty(&self) -> bool {
    self.country_code.is_none() && self.country.is_none() && self.state.is_none() && self.city.is_none()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn fold_strips_diacritics_and_case() {
    assert_eq!(ascii_fold("  São Paulo "), "sao paulo");
    assert_eq!(ascii_fold("Coeur d'Alene"), "coeur d'alene");
    assert_eq!(ascii_fold("Española"), "espanola");
  }

  #[test]
  fn us_input_becomes_structured() {
    let input = LocationInput {
      country_code: Some("us".into()),
      state_code: Some("ca".into()),
      city_id: Some(7),
      city: Some("ignored".into()),
      ..Default::default()
    };
    assert_eq!(
      input.normalize().unwrap(),
      Some(Location::Structured { state_code: Some("CA".into()), city_id: Some(7) })
    );
  }

  #[test]
  fn foreign_input_becomes_free_text() {
    let input = LocationInput {
      country_code: Some("FR".into()),
      state_code: Some("IDF".into()),
      city: Some("Paris".into()),
      ..Default::default()
    };
    assert_eq!(
      input.normalize().unwrap(),
      Some(Location::FreeText { country: Some("FR".into()), state: None, city: Some("Paris".into()) })
    );
  }

  #[test]
  fn empty_input_is_no_location() {
    assert_eq!(LocationInput::default().normalize().unwrap(), None);
  }

  #[test]
  fn city_without_state_is_rejected() {
    let input = LocationInput {
      country_code: Some("US".into()),
      city_id: Some(1),
      ..Default::default()
    };
    assert!(matches!(input.normalize(), Err(Error::Invalid(_))));
  }

  #[test]
  fn structured_parts_without_us_are_rejected() {
    let input = LocationInput { city_id: Some(1), ..Default::default() };
    assert!(matches!(input.normalize(), Err(Error::Invalid(_))));
  }
}
