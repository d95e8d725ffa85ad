//! Core types and trait definitions for the People Intel admin backend.
//!
//! No HTTP or database dependencies live here. The store, API and admin
//! crates all build on these types and on [`store::IntelStore`].

pub mod activity;
pub mod bulk;
pub mod company;
pub mod contact;
pub mod error;
pub mod location;
pub mod note;
pub mod query;
pub mod source;
pub mod store;
pub mod user;

mod patch;

pub use error::{DomainError, Error, ErrorKind, Result};
