//! `intel-admin`: maintenance commands for the People Intel database.
//!
//! # Usage
//!
//! ```text
//! intel-admin migrate --local
//! intel-admin backup --remote --remote-path /srv/intel/prod.sqlite
//! intel-admin restore backups/intel-sqlite-20250101T000000Z.sqlite --yes
//! intel-admin import-locations cities uscities.csv
//! intel-admin import-contacts contacts.csv
//! intel-admin export-contacts --out contacts.csv
//! intel-admin create-user --name Ada --email ada@example.com --role admin
//! ```

mod db;
mod exports;
mod imports;

use std::{
  fs::File,
  io::{self, BufRead as _, Write as _},
  path::{Path, PathBuf},
};

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand};
use db::DbArgs;
use imports::LocationKind;
use intel_core::{
  store::IntelStore,
  user::{NewUser, Role},
};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "intel-admin", version, about = "People Intel database maintenance")]
struct Cli {
  #[command(flatten)]
  db: DbArgs,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Apply the schema. Safe to run repeatedly.
  Migrate,

  /// Snapshot the database to a new file.
  Backup {
    /// Output file; defaults to `backups/intel-<source>-<timestamp>.sqlite`.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
  },

  /// Replace the database with a snapshot.
  Restore {
    #[arg(value_name = "FILE")]
    from: PathBuf,

    /// Confirm overwriting the current database.
    #[arg(long)]
    yes: bool,
  },

  /// Load countries, states or cities from CSV.
  ImportLocations {
    #[arg(value_enum)]
    kind: LocationKind,

    #[arg(value_name = "CSV")]
    file: PathBuf,
  },

  /// Load contacts from CSV, creating missing companies.
  ImportContacts {
    #[arg(value_name = "CSV")]
    file: PathBuf,
  },

  /// Write contacts as CSV to a file or stdout.
  ExportContacts {
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Skip inactive contacts.
    #[arg(long)]
    active_only: bool,
  },

  /// Create a user. The password is read from stdin when not given.
  CreateUser {
    #[arg(long)]
    name: String,

    #[arg(long)]
    last_name: Option<String>,

    #[arg(long)]
    email: String,

    #[arg(long, default_value = "viewer")]
    role: Role,

    #[arg(long, env = "INTEL_USER_PASSWORD", hide_env_values = true)]
    password: Option<String>,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_writer(io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  match cli.command {
    Command::Migrate => db::migrate(&cli.db).await?,

    Command::Backup { out } => {
      let out = out.unwrap_or_else(|| db::default_backup_path(cli.db.source()));
      db::backup(&cli.db, &out).await?;
      println!("{}", out.display());
    }

    Command::Restore { from, yes } => db::restore(&cli.db, &from, yes).await?,

    Command::ImportLocations { kind, file } => {
      let reader = open(&file)?;
      let store = cli.db.open().await?;
      let stats = imports::import_locations(&store, kind, reader).await?;
      println!("{kind:?}: {stats}");
      if stats.failed > 0 {
        bail!("{} row(s) failed", stats.failed);
      }
    }

    Command::ImportContacts { file } => {
      let reader = open(&file)?;
      let store = cli.db.open().await?;
      let stats = imports::import_contacts(&store, reader).await?;
      println!("contacts: {stats}");
      if stats.failed > 0 {
        bail!("{} row(s) failed", stats.failed);
      }
    }

    Command::ExportContacts { out, active_only } => {
      let store = cli.db.open().await?;
      let written = match &out {
        Some(path) => {
          let file =
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
          exports::export_contacts(&store, file, active_only).await?
        }
        None => exports::export_contacts(&store, io::stdout().lock(), active_only).await?,
      };
      tracing::info!(rows = written, "contacts exported");
    }

    Command::CreateUser { name, last_name, email, role, password } => {
      let password = match password {
        Some(p) => p,
        None => read_password()?,
      };
      if password.is_empty() {
        bail!("password must not be empty");
      }
      let password_hash = intel_api::auth::hash_password(&password)
        .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;

      let store = cli.db.open().await?;
      let user = store
        .create_user(NewUser { name, last_name, email, role, password_hash: Some(password_hash) })
        .await
        .context("failed to create user")?;
      println!("created user {} <{}> ({})", user.id, user.email, user.role);
    }
  }

  Ok(())
}

fn open(path: &Path) -> Result<File> {
  File::open(path).with_context(|| format!("failed to open {}", path.display()))
}

fn read_password() -> Result<String> {
  eprint!("Password: ");
  io::stderr().flush().ok();
  let mut line = String::new();
  io::stdin()
    .lock()
    .read_line(&mut line)
    .context("failed to read password")?;
  Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
