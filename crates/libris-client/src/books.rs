//! `/books` façade.
//!
//! | Method   | Path | Body |
//! |----------|------|------|
//! | `GET`    | `/books` | query `{search?, genre?, skip?, limit?}` |
//! | `GET`    | `/books/{id}` | |
//! | `POST`   | `/books` | multipart form |
//! | `PUT`    | `/books/{id}` | JSON, present fields only |
//! | `DELETE` | `/books/{id}` | |
//! | `GET`    | `/books/{id}/download` | |

use bytes::Bytes;
use libris_core::book::{Attachment, Book, BookId, BookQuery, BookUpdate, NewBook};
use reqwest::{
  Method,
  multipart::{Form, Part},
};

use crate::{error::Result, gateway::Gateway};

pub struct BooksApi<'a> {
  pub(crate) gateway: &'a Gateway,
}

impl BooksApi<'_> {
  /// `GET /books[?search=&genre=&skip=&limit=]`
  pub async fn list(&self, query: &BookQuery) -> Result<Vec<Book>> {
    let req = self.gateway.request(Method::GET, "/books").query(query);
    self.gateway.json(req).await
  }

  /// `GET /books/{id}`
  pub async fn get(&self, id: BookId) -> Result<Book> {
    let req = self.gateway.request(Method::GET, &format!("/books/{id}"));
    self.gateway.json(req).await
  }

  /// `POST /books` as multipart form data, optionally with the book file and
  /// a cover image.
  pub async fn create(&self, book: NewBook) -> Result<Book> {
    let form = new_book_form(book)?;
    let req = self.gateway.request(Method::POST, "/books").multipart(form);
    self.gateway.json(req).await
  }

  /// `PUT /books/{id}`
  pub async fn update(&self, id: BookId, update: &BookUpdate) -> Result<Book> {
    let req = self
      .gateway
      .request(Method::PUT, &format!("/books/{id}"))
      .json(update);
    self.gateway.json(req).await
  }

  /// `DELETE /books/{id}`
  pub async fn delete(&self, id: BookId) -> Result<()> {
    let req = self.gateway.request(Method::DELETE, &format!("/books/{id}"));
    self.gateway.empty(req).await
  }

  /// The direct download link for a book's file.
  pub fn download_url(&self, id: BookId) -> String { self.gateway.download_url(id) }

  /// Fetch the book's file through the gateway (so the credential is
  /// attached).
  pub async fn download(&self, id: BookId) -> Result<Bytes> {
    let req = self.gateway.request(Method::GET, &format!("/books/{id}/download"));
    self.gateway.bytes(req).await
  }
}

fn new_book_form(book: NewBook) -> Result<Form> {
  let mut form = Form::new()
    .text("title", book.title)
    .text("author", book.author)
    .text("total_copies", book.total_copies.to_string());

  let optional = [
    ("isbn", book.isbn),
    ("year", book.year.map(|y| y.to_string())),
    ("genre", book.genre),
    ("description", book.description),
  ];
  for (name, value) in optional {
    if let Some(value) = value {
      form = form.text(name, value);
    }
  }

  if let Some(file) = book.file {
    form = form.part("file", attachment_part(file)?);
  }
  if let Some(cover) = book.cover {
    form = form.part("cover", attachment_part(cover)?);
  }
  Ok(form)
}

fn attachment_part(attachment: Attachment) -> Result<Part> {
  let part = Part::bytes(attachment.bytes.to_vec()).file_name(attachment.file_name);
  Ok(match attachment.mime_type {
    Some(mime) => part.mime_str(&mime)?,
    None => part,
  })
}
