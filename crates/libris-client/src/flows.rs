//! Multi-call session flows: sign-in, sign-up and restoring a stored login.
//!
//! These are the only places where the client both talks to the API and
//! mutates the [`SessionStore`].

use libris_core::{
  identity::{Identity, NewAccount},
  session::SessionStore,
};

use crate::{LibraryClient, error::Result};

impl LibraryClient {
  /// Exchange username/password for a credential, fetch the identity with
  /// it, then record both in `session`.
  pub async fn sign_in(
    &self,
    session: &SessionStore,
    username: &str,
    password: &str,
  ) -> Result<Identity> {
    let token = self.auth().login(username, password).await?;
    let identity = self.auth().me_as(&token.access_token).await?;
    session.set_auth(identity.clone(), token.access_token);
    Ok(identity)
  }

  /// Register a new account, then sign in with it.
  pub async fn sign_up(
    &self,
    session: &SessionStore,
    account: &NewAccount,
  ) -> Result<Identity> {
    self.auth().register(account).await?;
    self
      .sign_in(session, &account.username, &account.password)
      .await
  }

  /// Hydrate `session` from storage and, if only a credential came back,
  /// re-fetch the identity it belongs to.
  ///
  /// Returns `Ok(None)` when nothing was stored. If the identity fetch fails
  /// the session is logged out and the error returned.
  pub async fn restore(&self, session: &SessionStore) -> Result<Option<Identity>> {
    session.load_from_storage();
    let snapshot = session.snapshot();
    if let Some(user) = snapshot.user {
      return Ok(Some(user));
    }
    let Some(token) = snapshot.token else {
      return Ok(None);
    };

    match self.auth().me().await {
      Ok(identity) => {
        session.set_auth(identity.clone(), token);
        Ok(Some(identity))
      }
      Err(e) => {
        tracing::debug!("stored credential no longer valid: {e}");
        session.logout();
        Err(e)
      }
    }
  }
}
