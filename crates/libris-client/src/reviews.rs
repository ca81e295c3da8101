//! `/reviews` façade.

use libris_core::{
  book::BookId,
  review::{NewReview, Review, ReviewId},
};
use reqwest::Method;

use crate::{error::Result, gateway::Gateway};

pub struct ReviewsApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl ReviewsApi<'_> {
  /// `GET /reviews/book/{bookId}`
  pub async fn for_book(&self, book_id: BookId) -> Result<Vec<Review>> {
    let req = self
      .gateway
      .request(Method::GET, &format!("/reviews/book/{book_id}"));
    self.gateway.json(req).await
  }

  /// `POST /reviews/book/{bookId}`
  pub async fn create(&self, book_id: BookId, review: &NewReview) -> Result<Review> {
    let req = self
      .gateway
      .request(Method::POST, &format!("/reviews/book/{book_id}"))
      .json(review);
    self.gateway.json(req).await
  }

  /// `DELETE /reviews/{reviewId}`
  pub async fn delete(&self, review_id: ReviewId) -> Result<()> {
    let req = self
      .gateway
      .request(Method::DELETE, &format!("/reviews/{review_id}"));
    self.gateway.empty(req).await
  }
}
