//! Identity and credential types.
//!
//! An [`Identity`] is who the server says the caller is; a [`Credential`] is
//! the opaque bearer string that proves it on later requests.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Server-assigned user identifier.
pub type UserId = i64;

/// The authenticated user, as returned by `GET /auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub id:         UserId,
  pub email:      String,
  pub username:   String,
  #[serde(default)]
  pub is_admin:   bool,
  #[serde(default)]
  pub created_at: Option<NaiveDateTime>,
}

// ─── Credential ──────────────────────────────────────────────────────────────

/// An opaque bearer token issued at login.
///
/// `Debug` never prints the token itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
  pub fn new(token: impl Into<String>) -> Self { Self(token.into()) }

  pub fn as_str(&self) -> &str { &self.0 }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

impl fmt::Debug for Credential {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Credential").field(&"<redacted>").finish()
  }
}

impl From<String> for Credential {
  fn from(token: String) -> Self { Self(token) }
}

impl From<&str> for Credential {
  fn from(token: &str) -> Self { Self(token.to_owned()) }
}

// ─── Auth payloads ───────────────────────────────────────────────────────────

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAccount {
  pub email:    String,
  pub username: String,
  pub password: String,
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessToken {
  pub access_token: Credential,
  #[serde(default = "default_token_type")]
  pub token_type:   String,
}

fn default_token_type() -> String { "bearer".to_owned() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn credential_debug_is_redacted() {
    let c = Credential::new("s3cret");
    assert!(!format!("{c:?}").contains("s3cret"));
  }

  #[test]
  fn access_token_defaults_type() {
    let t: AccessToken =
      serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
    assert_eq!(t.access_token.as_str(), "abc");
    assert_eq!(t.token_type, "bearer");
  }

  #[test]
  fn identity_parses_server_shape() {
    let raw = r#"{
      "id": 7, "email": "a@b.c", "username": "alice",
      "is_admin": false, "created_at": "2024-05-01T10:20:30.123456"
    }"#;
    let id: Identity = serde_json::from_str(raw).unwrap();
    assert_eq!(id.username, "alice");
    assert!(id.created_at.is_some());
  }
}
