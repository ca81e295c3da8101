//! `/borrows` façade.

use libris_core::{
  book::BookId,
  borrow::{Borrow, BorrowId},
};
use reqwest::Method;

use crate::{error::Result, gateway::Gateway};

pub struct BorrowsApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl BorrowsApi<'_> {
  /// `POST /borrows/{bookId}`
  pub async fn borrow(&self, book_id: BookId) -> Result<Borrow> {
    let req = self.gateway.request(Method::POST, &format!("/borrows/{book_id}"));
    self.gateway.json(req).await
  }

  /// `POST /borrows/{borrowId}/return`
  pub async fn return_book(&self, borrow_id: BorrowId) -> Result<Borrow> {
    let req = self
      .gateway
      .request(Method::POST, &format!("/borrows/{borrow_id}/return"));
    self.gateway.json(req).await
  }

  /// `GET /borrows/me`, newest first.
  pub async fn mine(&self) -> Result<Vec<Borrow>> {
    self.gateway.json(self.gateway.request(Method::GET, "/borrows/me")).await
  }
}
