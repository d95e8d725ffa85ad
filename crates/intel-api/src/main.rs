//! intel-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `INTEL_*` environment variables, resolves the data source, and serves the
//! JSON API over HTTP.
//!
//! # Password hash generation
//!
//! ```text
//! cargo run -p intel-api --bin intel-server -- --hash-password
//! ```

use std::{io::BufRead as _, path::PathBuf};

use anyhow::Context as _;
use clap::Parser;
use intel_api::{AppState, ServerConfig, auth::hash_password};
use intel_core::source::DataSource;
use intel_store_sqlite::{RemoteBinding, RuntimeEnv, connect, mock, resolve_source};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "People Intel API server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password read from stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let mut line = String::new();
    std::io::stdin()
      .lock()
      .read_line(&mut line)
      .context("failed to read password")?;
    let hash = hash_password(line.trim_end_matches(['\r', '\n']))
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("INTEL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // The remote binding is whatever the host hands us; here, an optional file.
  let env = match &server_cfg.remote_db_path {
    Some(path) => RuntimeEnv {
      remote: Some(
        RemoteBinding::open(path)
          .await
          .with_context(|| format!("failed to open remote database at {path:?}"))?,
      ),
    },
    None => RuntimeEnv::default(),
  };

  let db_cfg = server_cfg.database();
  let source = resolve_source(&db_cfg, Some(&env));
  if db_cfg.source == DataSource::Prod && source != DataSource::Prod {
    tracing::warn!("prod source requested without a remote binding; using sqlite");
  }

  let store = match source {
    DataSource::Mock => mock::seeded_store()
      .await
      .context("failed to seed mock dataset")?,
    other => connect(other, &db_cfg, Some(&env))
      .await
      .with_context(|| format!("failed to connect to {other} database"))?,
  };
  tracing::info!(%source, "data source ready");

  let mut state = AppState::new(store, source);
  state.session_ttl = chrono::Duration::hours(server_cfg.session_ttl_hours);

  let app = intel_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
