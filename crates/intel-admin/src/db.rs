//! Database target selection, schema migration, backup and restore.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use clap::Args;
use intel_core::source::DataSource;
use intel_store_sqlite::{
  DatabaseConfig, RemoteBinding, RuntimeEnv, SqliteStore, connect,
  connection::DEFAULT_SQLITE_PATH,
};

const SQLITE_MAGIC: &[u8; 16] = b"SQLite format 3\0";

/// Which database a command acts on. `--local` is the default.
#[derive(Args, Debug, Clone)]
pub struct DbArgs {
  /// Act on the local development database.
  #[arg(long, global = true, conflicts_with = "remote")]
  pub local: bool,

  /// Act on the remote production database.
  #[arg(long, global = true)]
  pub remote: bool,

  /// Local database file.
  #[arg(long, global = true, env = "INTEL_SQLITE_PATH", default_value = DEFAULT_SQLITE_PATH)]
  pub sqlite_path: PathBuf,

  /// Remote database file, required with `--remote`.
  #[arg(long, global = true, env = "INTEL_REMOTE_DB_PATH")]
  pub remote_path: Option<PathBuf>,
}

impl DbArgs {
  pub fn source(&self) -> DataSource {
    if self.remote { DataSource::Prod } else { DataSource::Sqlite }
  }

  /// The file behind the selected database.
  pub fn path(&self) -> Result<&Path> {
    if !self.remote {
      return Ok(&self.sqlite_path);
    }
    self
      .remote_path
      .as_deref()
      .context("--remote needs --remote-path or INTEL_REMOTE_DB_PATH")
  }

  /// Open the selected database. Local files get the schema applied; the
  /// remote database is used as-is.
  pub async fn open(&self) -> Result<SqliteStore> {
    let path = self.path()?;
    let config = DatabaseConfig { source: self.source(), sqlite_path: self.sqlite_path.clone() };
    let env = if self.remote {
      let binding = RemoteBinding::open(path)
        .await
        .with_context(|| format!("failed to open remote database at {}", path.display()))?;
      RuntimeEnv { remote: Some(binding) }
    } else {
      RuntimeEnv::default()
    };
    connect(self.source(), &config, Some(&env))
      .await
      .with_context(|| format!("failed to open {} database at {}", self.source(), path.display()))
  }
}

/// Apply the schema to the selected database.
pub async fn migrate(db: &DbArgs) -> Result<()> {
  let store = db.open().await?;
  store.migrate().await.context("failed to apply schema")?;
  store.close().await?;
  tracing::info!(source = %db.source(), path = %db.path()?.display(), "schema applied");
  Ok(())
}

/// Default backup location: `backups/intel-<source>-<timestamp>.sqlite`.
pub fn default_backup_path(source: DataSource) -> PathBuf {
  let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%SZ");
  PathBuf::from("backups").join(format!("intel-{source}-{stamp}.sqlite"))
}

/// Write a consistent snapshot of the selected database to `out`.
pub async fn backup(db: &DbArgs, out: &Path) -> Result<()> {
  if out.exists() {
    bail!("{} already exists", out.display());
  }
  if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  let store = db.open().await?;
  store
    .backup_to(out)
    .await
    .with_context(|| format!("failed to write backup to {}", out.display()))?;
  store.close().await?;
  tracing::info!(path = %out.display(), "backup written");
  Ok(())
}

/// Replace the selected database with the snapshot at `from`.
pub async fn restore(db: &DbArgs, from: &Path, confirmed: bool) -> Result<()> {
  let target = db.path()?;
  if !confirmed {
    bail!("restore overwrites {}; pass --yes to confirm", target.display());
  }

  let snapshot = tokio::fs::read(from)
    .await
    .with_context(|| format!("failed to read {}", from.display()))?;
  if !snapshot.starts_with(SQLITE_MAGIC) {
    bail!("{} is not an SQLite database", from.display());
  }

  if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(parent).await?;
  }
  // Stale journal files would be replayed over the restored snapshot.
  for suffix in ["-wal", "-shm"] {
    let mut journal = target.as_os_str().to_owned();
    journal.push(suffix);
    match tokio::fs::remove_file(PathBuf::from(journal)).await {
      Ok(()) => {}
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
      Err(e) => return Err(e).context("failed to remove journal file"),
    }
  }
  tokio::fs::write(target, &snapshot)
    .await
    .with_context(|| format!("failed to write {}", target.display()))?;

  tracing::warn!(from = %from.display(), to = %target.display(), "database restored");
  Ok(())
}

#[cfg(test)]
mod tests {
  use intel_core::{contact::NewContact, query::ContactQuery, store::IntelStore};

  use super::*;

  fn local(path: &Path) -> DbArgs {
    DbArgs { local: true, remote: false, sqlite_path: path.to_path_buf(), remote_path: None }
  }

  #[test]
  fn remote_requires_a_path() {
    let args = DbArgs { remote: true, local: false, ..local(Path::new("x.sqlite")) };
    assert!(args.path().is_err());
    assert_eq!(args.source(), DataSource::Prod);
  }

  #[tokio::test]
  async fn backup_then_restore_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = local(&dir.path().join("live.sqlite"));
    let snapshot = dir.path().join("snap/backup.sqlite");

    let store = db.open().await.unwrap();
    store
      .create_contact(NewContact::new("Ann", "Archive"), None)
      .await
      .unwrap();
    backup(&db, &snapshot).await.unwrap();
    assert!(backup(&db, &snapshot).await.is_err(), "backup must not overwrite");

    store
      .create_contact(NewContact::new("Ben", "Later"), None)
      .await
      .unwrap();
    store.close().await.unwrap();

    assert!(restore(&db, &snapshot, false).await.is_err());
    restore(&db, &snapshot, true).await.unwrap();

    let store = db.open().await.unwrap();
    let page = store.list_contacts(&ContactQuery::default()).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.data[0].contact.first_name, "Ann");
  }

  #[tokio::test]
  async fn restore_rejects_non_sqlite_files() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("notes.txt");
    std::fs::write(&bogus, "hello").unwrap();
    let db = local(&dir.path().join("live.sqlite"));
    assert!(restore(&db, &bogus, true).await.is_err());
  }
}
