//! Error types for `libris-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The credential backing failed to read, write or clear.
  #[error("credential storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("credential storage lock poisoned")]
  Poisoned,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
