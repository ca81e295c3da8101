//! Reviews. Created by the viewing user; deleted but never edited.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{book::BookId, identity::UserId};

pub type ReviewId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub id:         ReviewId,
  pub user_id:    UserId,
  pub book_id:    BookId,
  /// 1–5, enforced by the server.
  pub rating:     u8,
  #[serde(default)]
  pub text:       Option<String>,
  /// Filled in asynchronously by the server's sentiment job.
  #[serde(default)]
  pub sentiment:  Option<String>,
  pub created_at: NaiveDateTime,
  #[serde(default)]
  pub username:   Option<String>,
}

/// Body of `POST /reviews/book/{bookId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
  pub rating: u8,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub text:   Option<String>,
}

impl Default for NewReview {
  fn default() -> Self { Self { rating: 5, text: None } }
}
