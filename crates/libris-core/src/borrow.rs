//! Borrow records: the link between a user and a checked-out book.
//!
//! Created by a borrow, marked returned by a return, never deleted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{book::BookId, identity::UserId};

pub type BorrowId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Borrow {
  pub id:          BorrowId,
  pub user_id:     UserId,
  pub book_id:     BookId,
  pub borrowed_at: NaiveDateTime,
  #[serde(default)]
  pub returned_at: Option<NaiveDateTime>,
  pub is_returned: bool,
  #[serde(default)]
  pub book_title:  Option<String>,
}

impl Borrow {
  /// Display title, falling back to the numeric book id.
  pub fn title(&self) -> String {
    self
      .book_title
      .clone()
      .unwrap_or_else(|| format!("Book #{}", self.book_id))
  }
}

/// Split a borrow history into `(active, returned)`, preserving order.
pub fn partition(borrows: &[Borrow]) -> (Vec<&Borrow>, Vec<&Borrow>) {
  borrows.iter().partition(|b| !b.is_returned)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn borrow(id: BorrowId, returned: bool) -> Borrow {
    Borrow {
      id,
      user_id: 1,
      book_id: 10 + id,
      borrowed_at: "2024-03-01T09:00:00".parse().unwrap(),
      returned_at: returned.then(|| "2024-03-09T09:00:00".parse().unwrap()),
      is_returned: returned,
      book_title: None,
    }
  }

  #[test]
  fn partition_splits_active_and_returned() {
    let all = vec![borrow(1, false), borrow(2, true), borrow(3, false)];
    let (active, returned) = partition(&all);
    assert_eq!(active.iter().map(|b| b.id).collect::<Vec<_>>(), [1, 3]);
    assert_eq!(returned.iter().map(|b| b.id).collect::<Vec<_>>(), [2]);
  }

  #[test]
  fn title_falls_back_to_book_id() {
    assert_eq!(borrow(2, false).title(), "Book #12");
  }
}
