//! Recommendations are computed entirely server-side and re-fetched on every
//! visit; nothing here is persisted.

use serde::{Deserialize, Serialize};

use crate::book::Book;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
  pub book:   Book,
  pub score:  f64,
  pub reason: String,
}
