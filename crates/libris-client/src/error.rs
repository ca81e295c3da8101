//! Error type for every façade call.
//!
//! 401s are already handled globally by the gateway by the time callers see
//! [`ApiError::Unauthorized`]; everything else is for the call site to show.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  /// The server rejected the credential (or its absence).
  #[error("unauthorized: {detail}")]
  Unauthorized { detail: String },

  /// A non-success response carrying the server's `detail` message.
  #[error("{status}: {detail}")]
  Rejected { status: u16, detail: String },

  #[error("request failed: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("unexpected response body: {0}")]
  Decode(#[from] serde_json::Error),
}

impl ApiError {
  /// HTTP status of the response, if one was received.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED.as_u16()),
      Self::Rejected { status, .. } => Some(*status),
      Self::Transport(e) => e.status().map(|s| s.as_u16()),
      Self::Decode(_) => None,
    }
  }

  pub fn is_unauthorized(&self) -> bool { matches!(self, Self::Unauthorized { .. }) }

  /// Text to show the user: the server's detail verbatim when there is one,
  /// a generic fallback otherwise.
  pub fn user_message(&self) -> String {
    match self {
      Self::Unauthorized { detail } | Self::Rejected { detail, .. } => detail.clone(),
      Self::Transport(_) => "Could not reach the library server".to_owned(),
      Self::Decode(_) => "Unexpected response from the library server".to_owned(),
    }
  }
}

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Extract the human-readable message from an error response body.
///
/// String `detail`s are returned verbatim; structured ones (validation
/// errors) as compact JSON. Bodies without a `detail` fall back to the raw
/// text, then to the status's canonical reason.
pub(crate) fn detail_from_body(status: StatusCode, body: &[u8]) -> String {
  #[derive(Deserialize)]
  struct ErrorBody {
    detail: serde_json::Value,
  }

  match serde_json::from_slice::<ErrorBody>(body) {
    Ok(ErrorBody { detail: serde_json::Value::String(s) }) => s,
    Ok(ErrorBody { detail }) => detail.to_string(),
    Err(_) => {
      let text = String::from_utf8_lossy(body).trim().to_owned();
      if text.is_empty() {
        status
          .canonical_reason()
          .unwrap_or("request failed")
          .to_owned()
      } else {
        text
      }
    }
  }
}
