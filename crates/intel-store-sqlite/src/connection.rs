//! Source resolution and the connection provider.
//!
//! Both take their configuration explicitly; nothing here reads the process
//! environment.

use std::path::{Path, PathBuf};

use intel_core::source::DataSource;
use serde::Deserialize;
use tracing::debug;

use crate::{Result, SqliteStore};

pub const DEFAULT_SQLITE_PATH: &str = "./.data/dev.sqlite";

/// Which backing store is configured and where the local file lives.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
  #[serde(default)]
  pub source:      DataSource,
  #[serde(default = "default_sqlite_path")]
  pub sqlite_path: PathBuf,
}

fn default_sqlite_path() -> PathBuf { PathBuf::from(DEFAULT_SQLITE_PATH) }

impl Default for DatabaseConfig {
  fn default() -> Self {
    Self { source: DataSource::default(), sqlite_path: default_sqlite_path() }
  }
}

/// A live handle to the remote production database, provided by the host.
#[derive(Clone)]
pub struct RemoteBinding {
  conn: tokio_rusqlite::Connection,
}

impl RemoteBinding {
  pub fn new(conn: tokio_rusqlite::Connection) -> Self { Self { conn } }

  /// Open the remote database file. The schema is not touched.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    Ok(Self { conn: tokio_rusqlite::Connection::open(path).await? })
  }
}

impl std::fmt::Debug for RemoteBinding {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("RemoteBinding").finish_non_exhaustive()
  }
}

/// Bindings supplied by the runtime alongside the configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeEnv {
  pub remote: Option<RemoteBinding>,
}

/// Pick the active source. `prod` without a remote binding falls back to
/// `sqlite`; everything else passes through. Pure and idempotent.
pub fn resolve_source(config: &DatabaseConfig, env: Option<&RuntimeEnv>) -> DataSource {
  match config.source {
    DataSource::Prod if env.and_then(|e| e.remote.as_ref()).is_none() => DataSource::Sqlite,
    other => other,
  }
}

/// Return a store for an already resolved source.
///
/// `mock` has no database handle and is refused; callers branch on the
/// source before getting here.
pub async fn connect(
  source: DataSource,
  config: &DatabaseConfig,
  env: Option<&RuntimeEnv>,
) -> Result<SqliteStore> {
  match source {
    DataSource::Mock => Err(
      intel_core::Error::Configuration("database connection not available in mock mode".into())
        .into(),
    ),
    DataSource::Sqlite => {
      if let Some(parent) = config.sqlite_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
      }
      debug!(path = %config.sqlite_path.display(), "opening local database");
      SqliteStore::open(&config.sqlite_path).await
    }
    DataSource::Prod => {
      let binding = env.and_then(|e| e.remote.clone()).ok_or_else(|| {
        intel_core::Error::Configuration("remote database binding is missing".into())
      })?;
      SqliteStore::from_connection(binding.conn).await
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn config(source: DataSource) -> DatabaseConfig { DatabaseConfig { source, ..Default::default() } }

  async fn remote_env() -> RuntimeEnv {
    let conn = tokio_rusqlite::Connection::open_in_memory().await.unwrap();
    RuntimeEnv { remote: Some(RemoteBinding::new(conn)) }
  }

  #[test]
  fn prod_without_binding_downgrades() {
    let cfg = config(DataSource::Prod);
    assert_eq!(resolve_source(&cfg, None), DataSource::Sqlite);
    assert_eq!(resolve_source(&cfg, Some(&RuntimeEnv::default())), DataSource::Sqlite);
  }

  #[test]
  fn mock_and_sqlite_pass_through() {
    assert_eq!(resolve_source(&config(DataSource::Mock), None), DataSource::Mock);
    assert_eq!(resolve_source(&config(DataSource::Sqlite), None), DataSource::Sqlite);
  }

  #[tokio::test]
  async fn prod_with_binding_is_kept_and_stable() {
    let env = remote_env().await;
    let cfg = config(DataSource::Prod);
    let first = resolve_source(&cfg, Some(&env));
    let second = resolve_source(&cfg, Some(&env));
    assert_eq!(first, DataSource::Prod);
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn mock_has_no_connection() {
    let err = connect(DataSource::Mock, &DatabaseConfig::default(), None)
      .await
      .err()
      .unwrap();
    assert!(matches!(err, crate::Error::Core(intel_core::Error::Configuration(_))));
  }

  #[tokio::test]
  async fn prod_without_binding_fails_fast() {
    let err = connect(DataSource::Prod, &DatabaseConfig::default(), None)
      .await
      .err()
      .unwrap();
    assert!(matches!(err, crate::Error::Core(intel_core::Error::Configuration(_))));
  }

  #[tokio::test]
  async fn sqlite_creates_the_data_directory() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = DatabaseConfig {
      source:      DataSource::Sqlite,
      sqlite_path: dir.path().join("nested/data/dev.sqlite"),
    };

    connect(DataSource::Sqlite, &cfg, None).await.unwrap();
    // A second open against the same file is fine.
    connect(DataSource::Sqlite, &cfg, None).await.unwrap();
    assert!(cfg.sqlite_path.exists());
  }

  #[tokio::test]
  async fn prod_wraps_the_binding() {
    let env = remote_env().await;
    let store = connect(DataSource::Prod, &DatabaseConfig::default(), Some(&env)).await;
    assert!(store.is_ok());
  }
}
