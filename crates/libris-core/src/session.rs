//! The session store, the single owner of "who is logged in".
//!
//! A [`SessionStore`] pairs an in-memory [`Session`] with a [`TokenStore`]
//! that keeps the credential across restarts. It exposes exactly two
//! mutations ([`set_auth`](SessionStore::set_auth) and
//! [`logout`](SessionStore::logout)), a hydration step
//! ([`load_from_storage`](SessionStore::load_from_storage)) and read access.
//! Every mutation is published through a `watch` channel, so all subscribers
//! see it immediately.

use std::sync::Arc;

use tokio::sync::watch;

use crate::{
  identity::{Credential, Identity},
  token::TokenStore,
};

/// The current identity and credential.
///
/// `user` is only ever set together with `token`. `token` alone is the
/// transient state right after hydration, before the identity is re-fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
  pub user:  Option<Identity>,
  pub token: Option<Credential>,
}

impl Session {
  pub fn is_authenticated(&self) -> bool { self.user.is_some() }
}

/// Shared handle to the process-wide session.
///
/// Cloning is cheap; all clones observe and mutate the same session.
#[derive(Clone)]
pub struct SessionStore {
  state:   Arc<watch::Sender<Session>>,
  storage: Arc<dyn TokenStore>,
}

impl SessionStore {
  /// Create an empty session backed by `storage`. Call
  /// [`load_from_storage`](Self::load_from_storage) to hydrate it.
  pub fn new(storage: Arc<dyn TokenStore>) -> Self {
    let (state, _) = watch::channel(Session::default());
    Self { state: Arc::new(state), storage }
  }

  /// Persist `credential` and set both fields in one update.
  ///
  /// A failed storage write is logged; the in-memory session is still set.
  pub fn set_auth(&self, user: Identity, credential: Credential) {
    if let Err(e) = self.storage.save(&credential) {
      tracing::warn!("failed to persist credential: {e}");
    }
    tracing::debug!(username = %user.username, "session authenticated");
    self.state.send_replace(Session {
      user:  Some(user),
      token: Some(credential),
    });
  }

  /// Forget the credential everywhere. Calling this twice is harmless.
  pub fn logout(&self) {
    if let Err(e) = self.storage.clear() {
      tracing::warn!("failed to clear stored credential: {e}");
    }
    self.state.send_if_modified(|s| {
      let changed = s.user.is_some() || s.token.is_some();
      *s = Session::default();
      changed
    });
  }

  /// Restore a previously persisted credential into memory.
  ///
  /// Only `token` is set; fetching the identity is the caller's job. Returns
  /// whether a credential was found.
  pub fn load_from_storage(&self) -> bool {
    match self.storage.load() {
      Ok(Some(token)) => {
        self.state.send_modify(|s| s.token = Some(token));
        true
      }
      Ok(None) => false,
      Err(e) => {
        tracing::warn!("failed to read stored credential: {e}");
        false
      }
    }
  }

  /// The credential currently held by durable storage, read fresh.
  pub fn stored_credential(&self) -> Option<Credential> {
    match self.storage.load() {
      Ok(token) => token,
      Err(e) => {
        tracing::warn!("failed to read stored credential: {e}");
        None
      }
    }
  }

  /// A copy of the current session.
  pub fn snapshot(&self) -> Session { self.state.borrow().clone() }

  pub fn is_authenticated(&self) -> bool {
    self.state.borrow().is_authenticated()
  }

  /// Receive every subsequent session change.
  pub fn subscribe(&self) -> watch::Receiver<Session> { self.state.subscribe() }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{Error, Result, token::MemoryTokenStore};

  fn alice() -> Identity {
    Identity {
      id:         1,
      email:      "alice@example.com".into(),
      username:   "alice".into(),
      is_admin:   false,
      created_at: None,
    }
  }

  fn store() -> (SessionStore, Arc<MemoryTokenStore>) {
    let backing = Arc::new(MemoryTokenStore::new());
    (SessionStore::new(backing.clone()), backing)
  }

  /// A backing whose every operation fails.
  struct BrokenStore;

  impl TokenStore for BrokenStore {
    fn load(&self) -> Result<Option<Credential>> { Err(Error::Poisoned) }
    fn save(&self, _: &Credential) -> Result<()> { Err(Error::Poisoned) }
    fn clear(&self) -> Result<()> { Err(Error::Poisoned) }
  }

  #[test]
  fn starts_empty() {
    let (session, _) = store();
    assert_eq!(session.snapshot(), Session::default());
    assert!(!session.is_authenticated());
  }

  #[test]
  fn set_auth_persists_and_sets_both_fields() {
    let (session, backing) = store();
    session.set_auth(alice(), Credential::new("tok"));

    let snap = session.snapshot();
    assert_eq!(snap.user.as_ref().map(|u| u.username.as_str()), Some("alice"));
    assert_eq!(snap.token, Some(Credential::new("tok")));
    assert_eq!(backing.load().unwrap(), Some(Credential::new("tok")));
  }

  #[test]
  fn logout_clears_storage_and_memory_and_is_idempotent() {
    let (session, backing) = store();
    session.set_auth(alice(), Credential::new("tok"));

    session.logout();
    session.logout();

    assert_eq!(session.snapshot(), Session::default());
    assert!(backing.load().unwrap().is_none());
  }

  #[test]
  fn load_from_storage_sets_token_only() {
    let backing = Arc::new(MemoryTokenStore::with_credential(Credential::new("old")));
    let session = SessionStore::new(backing);

    assert!(session.load_from_storage());
    let snap = session.snapshot();
    assert_eq!(snap.token, Some(Credential::new("old")));
    assert!(snap.user.is_none());
    assert!(!snap.is_authenticated());
  }

  #[test]
  fn load_from_empty_storage_is_a_no_op() {
    let (session, _) = store();
    assert!(!session.load_from_storage());
    assert_eq!(session.snapshot(), Session::default());
  }

  #[test]
  fn storage_failures_are_not_surfaced() {
    let session = SessionStore::new(Arc::new(BrokenStore));
    session.set_auth(alice(), Credential::new("tok"));
    assert!(session.is_authenticated());
    assert!(session.stored_credential().is_none());
    assert!(!session.load_from_storage());
    session.logout();
    assert!(!session.is_authenticated());
  }

  #[test]
  fn subscribers_see_every_mutation() {
    let (session, _) = store();
    let mut rx = session.subscribe();

    session.set_auth(alice(), Credential::new("tok"));
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_authenticated());

    session.logout();
    assert!(rx.has_changed().unwrap());
    assert!(!rx.borrow_and_update().is_authenticated());
  }

  #[test]
  fn clones_share_state() {
    let (session, _) = store();
    let other = session.clone();
    other.set_auth(alice(), Credential::new("tok"));
    assert!(session.is_authenticated());
  }
}
