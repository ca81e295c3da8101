//! Core types for the Libris library client.
//!
//! No HTTP or database code lives here. The crate
//! holds the wire-level domain records, the [`session::SessionStore`], and
//! the [`token::TokenStore`] persistence port that durable backends
//! implement.

pub mod book;
pub mod borrow;
pub mod error;
pub mod identity;
pub mod preferences;
pub mod recommendation;
pub mod review;
pub mod session;
pub mod token;

pub use error::{Error, Result};
