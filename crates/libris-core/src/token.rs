//! The credential persistence port.
//!
//! The session layer only ever talks to a [`TokenStore`]; durable backends
//! (e.g. `libris-store-sqlite`) implement it, so the backing can change
//! without touching any call site.

use std::sync::Mutex;

use crate::{Error, Result, identity::Credential};

/// Durable storage for exactly one bearer credential.
///
/// Methods are synchronous: every implementation is a single-key read or
/// write and is called from the request path before each send.
pub trait TokenStore: Send + Sync {
  /// Return the stored credential, if any.
  fn load(&self) -> Result<Option<Credential>>;

  /// Persist `credential`, replacing any previous one.
  fn save(&self, credential: &Credential) -> Result<()>;

  /// Remove the stored credential. Clearing an empty store is not an error.
  fn clear(&self) -> Result<()>;
}

/// Process-local store; forgets everything on exit.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
  slot: Mutex<Option<Credential>>,
}

impl MemoryTokenStore {
  pub fn new() -> Self { Self::default() }

  /// A store that starts out holding `credential`.
  pub fn with_credential(credential: Credential) -> Self {
    Self { slot: Mutex::new(Some(credential)) }
  }
}

impl TokenStore for MemoryTokenStore {
  fn load(&self) -> Result<Option<Credential>> {
    Ok(self.slot.lock().map_err(|_| Error::Poisoned)?.clone())
  }

  fn save(&self, credential: &Credential) -> Result<()> {
    *self.slot.lock().map_err(|_| Error::Poisoned)? = Some(credential.clone());
    Ok(())
  }

  fn clear(&self) -> Result<()> {
    self.slot.lock().map_err(|_| Error::Poisoned)?.take();
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn save_load_clear() {
    let store = MemoryTokenStore::new();
    assert!(store.load().unwrap().is_none());

    store.save(&Credential::new("one")).unwrap();
    store.save(&Credential::new("two")).unwrap();
    assert_eq!(store.load().unwrap(), Some(Credential::new("two")));

    store.clear().unwrap();
    store.clear().unwrap();
    assert!(store.load().unwrap().is_none());
  }
}
