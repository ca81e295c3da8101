//! The request gateway: the one HTTP pipeline every façade goes through.
//!
//! Two behaviours are injected at construction and applied to every call:
//!
//! - a [`TokenProvider`], asked for the credential right before each send;
//!   when it returns one the request carries `Authorization: Bearer …`.
//! - an [`UnauthorizedHandler`], run on every `401` response no matter which
//!   façade issued the request. The error is still returned to the caller.
//!
//! Nothing here retries or caches.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use libris_core::{book::BookId, identity::Credential, session::SessionStore};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, Result, detail_from_body};

/// Base address used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

// ─── Config ───────────────────────────────────────────────────────────────────

/// Connection settings for the library API.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
  pub base_url:        String,
  /// `None` leaves requests without a deadline.
  pub request_timeout: Option<Duration>,
}

impl Default for GatewayConfig {
  fn default() -> Self {
    Self {
      base_url:        DEFAULT_BASE_URL.to_owned(),
      request_timeout: None,
    }
  }
}

impl GatewayConfig {
  pub fn new(base_url: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      ..Self::default()
    }
  }
}

// ─── Injected behaviour ───────────────────────────────────────────────────────

/// Supplies the credential to attach to an outgoing request.
pub trait TokenProvider: Send + Sync {
  fn credential(&self) -> Option<Credential>;
}

impl<F> TokenProvider for F
where
  F: Fn() -> Option<Credential> + Send + Sync,
{
  fn credential(&self) -> Option<Credential> { self() }
}

/// Reacts to an authorization failure.
pub trait UnauthorizedHandler: Send + Sync {
  fn unauthorized(&self);
}

impl<F> UnauthorizedHandler for F
where
  F: Fn() + Send + Sync,
{
  fn unauthorized(&self) { self() }
}

// ─── Gateway ──────────────────────────────────────────────────────────────────

/// The configured HTTP pipeline.
///
/// Cheap to clone; the inner [`reqwest::Client`] and both callbacks are
/// `Arc`-based.
#[derive(Clone)]
pub struct Gateway {
  client:          Client,
  config:          GatewayConfig,
  tokens:          Arc<dyn TokenProvider>,
  on_unauthorized: Arc<dyn UnauthorizedHandler>,
}

impl Gateway {
  pub fn new(
    config: GatewayConfig,
    tokens: impl TokenProvider + 'static,
    on_unauthorized: impl UnauthorizedHandler + 'static,
  ) -> Result<Self> {
    let mut builder = Client::builder();
    if let Some(timeout) = config.request_timeout {
      builder = builder.timeout(timeout);
    }
    let client = builder.build()?;
    Ok(Self {
      client,
      config,
      tokens: Arc::new(tokens),
      on_unauthorized: Arc::new(on_unauthorized),
    })
  }

  /// A gateway that never authenticates and ignores 401s.
  pub fn anonymous(config: GatewayConfig) -> Result<Self> {
    Self::new(config, || None::<Credential>, || {})
  }

  /// The standard wiring: the credential comes from `session`'s durable
  /// storage, and a 401 logs the session out before calling `redirect`.
  pub fn with_session(
    config: GatewayConfig,
    session: SessionStore,
    redirect: impl Fn() + Send + Sync + 'static,
  ) -> Result<Self> {
    let reader = session.clone();
    Self::new(
      config,
      move || reader.stored_credential(),
      move || {
        session.logout();
        redirect();
      },
    )
  }

  pub fn base_url(&self) -> &str { self.config.base_url.trim_end_matches('/') }

  pub fn url(&self, path: &str) -> String { format!("{}{}", self.base_url(), path) }

  /// Start a request to `path` (relative to the base address).
  pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
    self.client.request(method, self.url(path))
  }

  /// Direct link to a book's file. Handed out as-is rather than fetched
  /// through a façade.
  pub fn download_url(&self, book_id: BookId) -> String {
    self.url(&format!("/books/{book_id}/download"))
  }

  // ── Sending ───────────────────────────────────────────────────────────────

  /// Send `req` with whatever credential the provider currently yields.
  pub async fn send(&self, req: RequestBuilder) -> Result<Response> {
    let credential = self.tokens.credential();
    self.dispatch(req, credential.as_ref()).await
  }

  /// Send `req` with an explicit credential, bypassing the provider. Used
  /// right after login, before the credential has been stored.
  pub async fn send_as(
    &self,
    req: RequestBuilder,
    credential: &Credential,
  ) -> Result<Response> {
    self.dispatch(req, Some(credential)).await
  }

  /// Send and decode a JSON body.
  pub async fn json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T> {
    let resp = self.send(req).await?;
    decode(resp).await
  }

  /// Send and decode a JSON body using an explicit credential.
  pub async fn json_as<T: DeserializeOwned>(
    &self,
    req: RequestBuilder,
    credential: &Credential,
  ) -> Result<T> {
    let resp = self.send_as(req, credential).await?;
    decode(resp).await
  }

  /// Send and discard the body (e.g. `204 No Content`).
  pub async fn empty(&self, req: RequestBuilder) -> Result<()> {
    self.send(req).await?;
    Ok(())
  }

  /// Send and return the raw body.
  pub async fn bytes(&self, req: RequestBuilder) -> Result<Bytes> {
    let resp = self.send(req).await?;
    Ok(resp.bytes().await?)
  }

  async fn dispatch(
    &self,
    req: RequestBuilder,
    credential: Option<&Credential>,
  ) -> Result<Response> {
    let req = match credential {
      Some(c) => req.bearer_auth(c.as_str()),
      None => req,
    };
    let req = req.build()?;
    let method = req.method().clone();
    let path = req.url().path().to_owned();

    let resp = self.client.execute(req).await?;
    let status = resp.status();
    tracing::debug!(%method, %path, status = status.as_u16(), "api call");

    if status.is_success() {
      return Ok(resp);
    }

    let body = resp.bytes().await.unwrap_or_default();
    let detail = detail_from_body(status, &body);

    if status == StatusCode::UNAUTHORIZED {
      tracing::warn!(%method, %path, "credential rejected; clearing session");
      self.on_unauthorized.unauthorized();
      return Err(ApiError::Unauthorized { detail });
    }

    Err(ApiError::Rejected { status: status.as_u16(), detail })
  }
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T> {
  let body = resp.bytes().await?;
  Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn url_joins_without_double_slash() {
    let g = Gateway::anonymous(GatewayConfig::new("http://example.test/")).unwrap();
    assert_eq!(g.url("/books"), "http://example.test/books");
    assert_eq!(g.download_url(9), "http://example.test/books/9/download");
  }

  #[test]
  fn default_config_points_at_localhost() {
    let cfg = GatewayConfig::default();
    assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
    assert!(cfg.request_timeout.is_none());
  }
}
