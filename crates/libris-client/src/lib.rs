//! Typed client for the library HTTP API.
//!
//! All calls go through one [`Gateway`], which attaches the bearer
//! credential and handles `401`s globally. On top of it sits one thin façade
//! per resource; each façade method is exactly one HTTP request.
//!
//! ```rust,ignore
//! let gateway = Gateway::with_session(GatewayConfig::default(), session.clone(), || {})?;
//! let client = LibraryClient::new(gateway);
//! let books = client.books().list(&BookQuery::default()).await?;
//! ```

pub mod auth;
pub mod books;
pub mod borrows;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod preferences;
pub mod recommendations;
pub mod reviews;

use libris_core::{book::{Book, BookId}, review::Review};
use serde::Serialize;

pub use error::{ApiError, Result};
pub use gateway::{Gateway, GatewayConfig, TokenProvider, UnauthorizedHandler};

use crate::{
  auth::AuthApi, books::BooksApi, borrows::BorrowsApi, preferences::PreferencesApi,
  recommendations::RecommendationsApi, reviews::ReviewsApi,
};

/// Entry point bundling the gateway with its façades.
///
/// Cheap to clone; clones share the underlying connection pool and session
/// callbacks.
#[derive(Clone)]
pub struct LibraryClient {
  gateway: Gateway,
}

/// A book together with its reviews: the book detail page's view model.
#[derive(Debug, Clone, Serialize)]
pub struct BookPage {
  pub book:    Book,
  pub reviews: Vec<Review>,
}

impl LibraryClient {
  pub fn new(gateway: Gateway) -> Self { Self { gateway } }

  pub fn gateway(&self) -> &Gateway { &self.gateway }

  pub fn auth(&self) -> AuthApi<'_> { AuthApi { gateway: &self.gateway } }

  pub fn books(&self) -> BooksApi<'_> { BooksApi { gateway: &self.gateway } }

  pub fn borrows(&self) -> BorrowsApi<'_> { BorrowsApi { gateway: &self.gateway } }

  pub fn reviews(&self) -> ReviewsApi<'_> { ReviewsApi { gateway: &self.gateway } }

  pub fn recommendations(&self) -> RecommendationsApi<'_> {
    RecommendationsApi { gateway: &self.gateway }
  }

  pub fn preferences(&self) -> PreferencesApi<'_> {
    PreferencesApi { gateway: &self.gateway }
  }

  /// Fetch a book and its reviews concurrently.
  pub async fn book_page(&self, id: BookId) -> Result<BookPage> {
    let books = self.books();
    let reviews = self.reviews();
    let (book, reviews) = tokio::try_join!(books.get(id), reviews.for_book(id))?;
    Ok(BookPage { book, reviews })
  }
}
