//! Catalog records.
//!
//! A [`Book`] is read-only from the client's point of view; the copy counters
//! move server-side on borrow and return.

use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type BookId = i64;

/// A catalog entry as returned by `GET /books` and `GET /books/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
  pub id:               BookId,
  pub title:            String,
  pub author:           String,
  #[serde(default)]
  pub isbn:             Option<String>,
  #[serde(default)]
  pub description:      Option<String>,
  #[serde(default)]
  pub genre:            Option<String>,
  #[serde(default)]
  pub year:             Option<i32>,
  pub total_copies:     i32,
  pub available_copies: i32,
  #[serde(default)]
  pub file_path:        Option<String>,
  #[serde(default)]
  pub cover_path:       Option<String>,
  /// Generated server-side after creation; absent until the job finishes.
  #[serde(default)]
  pub ai_summary:       Option<String>,
  #[serde(default)]
  pub review_consensus: Option<String>,
  #[serde(default)]
  pub avg_rating:       Option<f64>,
  #[serde(default)]
  pub created_at:       Option<NaiveDateTime>,
}

impl Book {
  pub fn is_available(&self) -> bool { self.available_copies > 0 }

  /// Whether the server holds a downloadable file for this book.
  pub fn has_file(&self) -> bool { self.file_path.is_some() }
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// Parameters for `GET /books`. Absent fields are omitted from the query
/// string entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BookQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub search: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub genre:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub skip:   Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit:  Option<u32>,
}

impl BookQuery {
  /// Build a query from free-text filter inputs; empty strings mean "no
  /// filter".
  pub fn from_filters(search: &str, genre: &str) -> Self {
    let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_owned());
    Self {
      search: non_empty(search),
      genre: non_empty(genre),
      ..Self::default()
    }
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

/// A file part of a multipart upload.
#[derive(Debug, Clone)]
pub struct Attachment {
  pub file_name: String,
  pub mime_type: Option<String>,
  pub bytes:     Bytes,
}

/// Fields of `POST /books`, sent as multipart form data.
#[derive(Debug, Clone)]
pub struct NewBook {
  pub title:        String,
  pub author:       String,
  pub isbn:         Option<String>,
  pub year:         Option<i32>,
  pub genre:        Option<String>,
  pub total_copies: i32,
  pub description:  Option<String>,
  pub file:         Option<Attachment>,
  pub cover:        Option<Attachment>,
}

impl NewBook {
  pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
    Self {
      title:        title.into(),
      author:       author.into(),
      isbn:         None,
      year:         None,
      genre:        None,
      total_copies: 1,
      description:  None,
      file:         None,
      cover:        None,
    }
  }
}

/// Body of `PUT /books/{id}`. Only fields that are `Some` are sent, so the
/// server leaves the rest untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BookUpdate {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author:       Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub isbn:         Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description:  Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub genre:        Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub year:         Option<i32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub total_copies: Option<i32>,
}

impl BookUpdate {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.author.is_none()
      && self.isbn.is_none()
      && self.description.is_none()
      && self.genre.is_none()
      && self.year.is_none()
      && self.total_copies.is_none()
  }
}
