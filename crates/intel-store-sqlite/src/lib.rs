//! SQLite backend for the People Intel store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Also home to the source resolver, the
//! connection provider and the mock dataset.

mod companies;
mod contacts;
mod encode;
mod notes;
mod reference;
mod schema;
mod store;
mod users;

pub mod connection;
pub mod error;
pub mod mock;

pub use connection::{DatabaseConfig, RemoteBinding, RuntimeEnv, connect, resolve_source};
pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
