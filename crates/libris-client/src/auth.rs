//! `/auth` façade.
//!
//! | Method | Path | Body |
//! |--------|------|------|
//! | `POST` | `/auth/register` | JSON `{email, username, password}` |
//! | `POST` | `/auth/login` | form-urlencoded `{username, password}` |
//! | `GET`  | `/auth/me` | |

use libris_core::identity::{AccessToken, Credential, Identity, NewAccount};
use reqwest::Method;

use crate::{error::Result, gateway::Gateway};

pub struct AuthApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl AuthApi<'_> {
  /// `POST /auth/register`
  pub async fn register(&self, account: &NewAccount) -> Result<Identity> {
    let req = self.gateway.request(Method::POST, "/auth/register").json(account);
    self.gateway.json(req).await
  }

  /// `POST /auth/login`, the one form-encoded call in the API.
  pub async fn login(&self, username: &str, password: &str) -> Result<AccessToken> {
    let req = self
      .gateway
      .request(Method::POST, "/auth/login")
      .form(&[("username", username), ("password", password)]);
    self.gateway.json(req).await
  }

  /// `GET /auth/me`
  pub async fn me(&self) -> Result<Identity> {
    self.gateway.json(self.gateway.request(Method::GET, "/auth/me")).await
  }

  /// `GET /auth/me` authenticated with `credential` instead of the stored one.
  pub async fn me_as(&self, credential: &Credential) -> Result<Identity> {
    let req = self.gateway.request(Method::GET, "/auth/me");
    self.gateway.json_as(req, credential).await
  }
}
