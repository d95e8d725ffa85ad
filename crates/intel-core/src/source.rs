//! Backing-store selection tag.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Which backing store serves requests.
///
/// `Mock` is a static in-memory dataset, `Sqlite` a local file-backed
/// database, `Prod` the managed remote database handed in by the host.
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
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum DataSource {
  Mock,
  #[default]
  Sqlite,
  Prod,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_config_values() {
    assert_eq!("mock".parse::<DataSource>().unwrap(), DataSource::Mock);
    assert_eq!("SQLite".parse::<DataSource>().unwrap(), DataSource::Sqlite);
    assert_eq!("prod".parse::<DataSource>().unwrap(), DataSource::Prod);
    assert!("postgres".parse::<DataSource>().is_err());
  }

  #[test]
  fn displays_lowercase() {
    assert_eq!(DataSource::Prod.to_string(), "prod");
    assert_eq!(DataSource::default().as_ref(), "sqlite");
  }
}
