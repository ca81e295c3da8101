//! SQLite backing for the Libris credential store.
//!
//! Implements [`libris_core::token::TokenStore`] over a single-table SQLite
//! file, so a login survives process restarts.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteTokenStore;
