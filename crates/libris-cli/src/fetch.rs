//! The per-view fetch state machine.
//!
//! `Idle → Loading → Loaded | Errored`. Starting a new fetch keeps the last
//! good result around so the view doesn't blank while it reloads; whichever
//! response arrives last wins.

use libris_client::ApiError;

#[derive(Debug, Clone)]
pub enum Fetch<T> {
  Idle,
  /// In flight, still showing the previous result if there was one.
  Loading(Option<T>),
  Loaded(T),
  Errored { message: String, stale: Option<T> },
}

impl<T> Default for Fetch<T> {
  fn default() -> Self { Self::Idle }
}

impl<T> Fetch<T> {
  /// Enter `Loading`, carrying over whatever data is currently shown.
  pub fn begin(&mut self) {
    let previous = std::mem::take(self).into_data();
    *self = Self::Loading(previous);
  }

  /// Apply a response. Errors keep the previous data visible.
  pub fn resolve(&mut self, result: Result<T, ApiError>) {
    *self = match result {
      Ok(data) => Self::Loaded(data),
      Err(e) => Self::Errored {
        message: e.user_message(),
        stale:   std::mem::take(self).into_data(),
      },
    };
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      Self::Idle => None,
      Self::Loading(previous) => previous.as_ref(),
      Self::Loaded(data) => Some(data),
      Self::Errored { stale, .. } => stale.as_ref(),
    }
  }

  pub fn is_loading(&self) -> bool { matches!(self, Self::Loading(_)) }

  pub fn error(&self) -> Option<&str> {
    match self {
      Self::Errored { message, .. } => Some(message),
      _ => None,
    }
  }

  fn into_data(self) -> Option<T> {
    match self {
      Self::Idle => None,
      Self::Loading(previous) => previous,
      Self::Loaded(data) => Some(data),
      Self::Errored { stale, .. } => stale,
    }
  }
}
