//! Error type for `libris-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("could not create store directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("connection lock poisoned")]
  Poisoned,
}

impl From<Error> for libris_core::Error {
  fn from(e: Error) -> Self { libris_core::Error::Storage(Box::new(e)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
