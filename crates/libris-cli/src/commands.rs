//! One-shot subcommands: each runs a single flow against the API and prints
//! the result, as text or (with `--json`) as the raw response body.

use std::{
  io::{self, BufRead, Write},
  path::{Path, PathBuf},
};

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use libris_client::{ApiError, LibraryClient, recommendations::DEFAULT_LIMIT};
use libris_core::{
  book::{Attachment, Book, BookId, BookQuery, BookUpdate, NewBook},
  borrow::{self, BorrowId},
  identity::NewAccount,
  preferences::PreferenceUpdate,
  review::{NewReview, Review, ReviewId},
  session::SessionStore,
};
use serde::Serialize;

// ─── Command tree ─────────────────────────────────────────────────────────────

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create an account and log in with it.
  Register {
    #[arg(long)]
    email:    String,
    #[arg(long)]
    username: String,
    /// Prompted for on stdin when omitted.
    #[arg(long)]
    password: Option<String>,
  },
  /// Log in and remember the credential.
  Login {
    #[arg(long)]
    username: String,
    /// Prompted for on stdin when omitted.
    #[arg(long)]
    password: Option<String>,
  },
  /// Forget the stored credential.
  Logout,
  /// Show the logged-in account.
  ///
  /// Any failure to confirm the stored login clears it, including an
  /// unreachable server. Run `libris login` again afterwards.
  Whoami,
  /// Browse and manage the catalog.
  Books {
    #[command(subcommand)]
    command: BooksCommand,
  },
  /// Borrow a copy of a book.
  Borrow { book_id: BookId },
  /// Return a borrowed book.
  Return { borrow_id: BorrowId },
  /// List your borrows, current and past.
  Borrows,
  /// Read and write reviews.
  Reviews {
    #[command(subcommand)]
    command: ReviewsCommand,
  },
  /// Books picked for you.
  Recommendations {
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    limit: u32,
  },
  /// Reading preferences.
  Prefs {
    #[command(subcommand)]
    command: PrefsCommand,
  },
}

#[derive(Subcommand, Debug)]
pub enum BooksCommand {
  List {
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    genre:  Option<String>,
    #[arg(long)]
    skip:   Option<u32>,
    #[arg(long)]
    limit:  Option<u32>,
  },
  /// A book with its reviews.
  Show { id: BookId },
  Add(AddBook),
  Update {
    id:     BookId,
    #[command(flatten)]
    fields: BookFields,
  },
  Delete { id: BookId },
  /// Save the book's file locally.
  Download {
    id:     BookId,
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
}

#[derive(Args, Debug)]
pub struct AddBook {
  #[arg(long)]
  title:       String,
  #[arg(long)]
  author:      String,
  #[arg(long)]
  isbn:        Option<String>,
  #[arg(long)]
  year:        Option<i32>,
  #[arg(long)]
  genre:       Option<String>,
  #[arg(long, default_value_t = 1)]
  copies:      i32,
  #[arg(long)]
  description: Option<String>,
  /// Book file to upload (PDF, EPUB, …).
  #[arg(long)]
  file:        Option<PathBuf>,
  /// Cover image to upload.
  #[arg(long)]
  cover:       Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BookFields {
  #[arg(long)]
  title:       Option<String>,
  #[arg(long)]
  author:      Option<String>,
  #[arg(long)]
  isbn:        Option<String>,
  #[arg(long)]
  year:        Option<i32>,
  #[arg(long)]
  genre:       Option<String>,
  #[arg(long)]
  copies:      Option<i32>,
  #[arg(long)]
  description: Option<String>,
}

impl From<BookFields> for BookUpdate {
  fn from(f: BookFields) -> Self {
    Self {
      title:        f.title,
      author:       f.author,
      isbn:         f.isbn,
      description:  f.description,
      genre:        f.genre,
      year:         f.year,
      total_copies: f.copies,
    }
  }
}

#[derive(Subcommand, Debug)]
pub enum ReviewsCommand {
  List { book_id: BookId },
  Add {
    book_id: BookId,
    #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
    rating:  u8,
    #[arg(long)]
    text:    Option<String>,
  },
  Delete { review_id: ReviewId },
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
  Show,
  /// Overwrite the given fields; the rest are left as they are.
  Set {
    /// Comma-separated, e.g. "Fiction, History".
    #[arg(long)]
    genres:  Option<String>,
    #[arg(long)]
    authors: Option<String>,
  },
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// What a subcommand runs against.
pub struct Invocation<'a> {
  pub client:  &'a LibraryClient,
  pub session: &'a SessionStore,
  pub json:    bool,
}

/// Run `command`. The session has only been hydrated from storage; nothing
/// has been checked against the server yet.
pub async fn run(command: Command, ctx: Invocation<'_>) -> Result<()> {
  let Invocation { client, session, json } = ctx;

  match command {
    Command::Register { email, username, password } => {
      let password = password_or_prompt(password)?;
      let account = NewAccount { email, username, password };
      let user = api(client.sign_up(session, &account).await)?;
      output(json, &user, || println!("Registered and logged in as {}", user.username))
    }
    Command::Login { username, password } => {
      let password = password_or_prompt(password)?;
      let user = api(client.sign_in(session, &username, &password).await)?;
      output(json, &user, || println!("Logged in as {}", user.username))
    }
    Command::Logout => {
      session.logout();
      println!("Logged out");
      Ok(())
    }
    Command::Whoami => match api(client.restore(session).await)? {
      Some(user) => output(json, &user, || {
        println!("{} <{}>", user.username, user.email);
        if user.is_admin {
          println!("admin");
        }
      }),
      None => bail!("not logged in; run `libris login`"),
    },

    Command::Books { command } => books(client, session, json, command).await,

    Command::Borrow { book_id } => {
      require_login(session)?;
      let record = api(client.borrows().borrow(book_id).await)?;
      let book = api(client.books().get(book_id).await)?;
      output(json, &record, || {
        println!("Borrowed {} (borrow #{})", record.title(), record.id);
        println!("{} of {} copies left", book.available_copies, book.total_copies);
      })
    }
    Command::Return { borrow_id } => {
      require_login(session)?;
      let record = api(client.borrows().return_book(borrow_id).await)?;
      output(json, &record, || println!("Returned {}", record.title()))
    }
    Command::Borrows => {
      let all = api(client.borrows().mine().await)?;
      output(json, &all, || {
        let (active, returned) = borrow::partition(&all);
        println!("Currently borrowed ({})", active.len());
        for b in &active {
          println!("  #{:<5} {}  since {}", b.id, b.title(), b.borrowed_at.format("%Y-%m-%d"));
        }
        println!("History ({})", returned.len());
        for b in &returned {
          let at = b
            .returned_at
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
          println!("  #{:<5} {}  returned {at}", b.id, b.title());
        }
      })
    }

    Command::Reviews { command } => reviews(client, session, json, command).await,

    Command::Recommendations { limit } => {
      let recs = api(client.recommendations().get(limit).await)?;
      output(json, &recs, || {
        if recs.is_empty() {
          println!("No recommendations yet.");
        }
        for rec in &recs {
          println!("{:>3.0}%  {}  ({})", rec.score * 100.0, rec.book.title, rec.book.author);
          println!("      {}", rec.reason);
        }
      })
    }

    Command::Prefs { command: PrefsCommand::Show } => {
      let prefs = api(client.preferences().get().await)?;
      output(json, &prefs, || {
        println!("favorite genres:  {}", prefs.favorite_genres);
        println!("favorite authors: {}", prefs.favorite_authors);
      })
    }
    Command::Prefs { command: PrefsCommand::Set { genres, authors } } => {
      require_login(session)?;
      let update = PreferenceUpdate {
        favorite_genres:  genres,
        favorite_authors: authors,
      };
      api(client.preferences().update(&update).await)?;
      let prefs = api(client.preferences().get().await)?;
      output(json, &prefs, || println!("Saved!"))
    }
  }
}

async fn books(
  client: &LibraryClient,
  session: &SessionStore,
  json: bool,
  command: BooksCommand,
) -> Result<()> {
  match command {
    BooksCommand::List { search, genre, skip, limit } => {
      let query = BookQuery { search, genre, skip, limit };
      let books = api(client.books().list(&query).await)?;
      output(json, &books, || {
        if books.is_empty() {
          println!("No books found.");
        }
        for book in &books {
          println!("{}", book_line(book));
        }
      })
    }
    BooksCommand::Show { id } => {
      let page = api(client.book_page(id).await)?;
      output(json, &page, || {
        print_book(&page.book);
        if let Some(path) = &page.book.file_path {
          println!("download:  {}  ({path})", client.books().download_url(id));
        }
        println!();
        println!("Reviews ({})", page.reviews.len());
        for review in &page.reviews {
          print_review(review);
        }
      })
    }
    BooksCommand::Add(add) => {
      require_login(session)?;
      let mut book = NewBook::new(add.title, add.author);
      book.isbn = add.isbn;
      book.year = add.year;
      book.genre = add.genre;
      book.total_copies = add.copies;
      book.description = add.description;
      book.file = match &add.file {
        Some(path) => Some(attachment(path).await?),
        None => None,
      };
      book.cover = match &add.cover {
        Some(path) => Some(attachment(path).await?),
        None => None,
      };
      let created = api(client.books().create(book).await)?;
      output(json, &created, || println!("Added #{} {}", created.id, created.title))
    }
    BooksCommand::Update { id, fields } => {
      require_login(session)?;
      let update = BookUpdate::from(fields);
      if update.is_empty() {
        bail!("nothing to update; pass at least one field");
      }
      let updated = api(client.books().update(id, &update).await)?;
      output(json, &updated, || print_book(&updated))
    }
    BooksCommand::Delete { id } => {
      require_login(session)?;
      api(client.books().delete(id).await)?;
      println!("Deleted book #{id}");
      Ok(())
    }
    BooksCommand::Download { id, output: target } => {
      let target = match target {
        Some(path) => path,
        None => {
          let book = api(client.books().get(id).await)?;
          default_download_name(&book)
        }
      };
      let bytes = api(client.books().download(id).await)?;
      tokio::fs::write(&target, &bytes)
        .await
        .with_context(|| format!("failed to write {}", target.display()))?;
      println!("Saved {} bytes to {}", bytes.len(), target.display());
      Ok(())
    }
  }
}

async fn reviews(
  client: &LibraryClient,
  session: &SessionStore,
  json: bool,
  command: ReviewsCommand,
) -> Result<()> {
  match command {
    ReviewsCommand::List { book_id } => {
      let reviews = api(client.reviews().for_book(book_id).await)?;
      output(json, &reviews, || {
        if reviews.is_empty() {
          println!("No reviews yet.");
        }
        for review in &reviews {
          print_review(review);
        }
      })
    }
    ReviewsCommand::Add { book_id, rating, text } => {
      require_login(session)?;
      let review = api(client.reviews().create(book_id, &NewReview { rating, text }).await)?;
      output(json, &review, || println!("Posted review #{}", review.id))
    }
    ReviewsCommand::Delete { review_id } => {
      require_login(session)?;
      api(client.reviews().delete(review_id).await)?;
      println!("Deleted review #{review_id}");
      Ok(())
    }
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Keep the server's message on top, with the typed error as its cause.
fn api<T>(result: libris_client::Result<T>) -> Result<T> {
  result.map_err(|e: ApiError| {
    let message = e.user_message();
    anyhow::Error::new(e).context(message)
  })
}

/// Mutations need a stored credential; fail before making any request.
fn require_login(session: &SessionStore) -> Result<()> {
  if session.stored_credential().is_none() {
    bail!("not logged in; run `libris login` first");
  }
  Ok(())
}

fn output<T: Serialize>(json: bool, value: &T, text: impl FnOnce()) -> Result<()> {
  if json {
    println!("{}", serde_json::to_string_pretty(value)?);
  } else {
    text();
  }
  Ok(())
}

fn book_line(book: &Book) -> String {
  let copies = if book.is_available() {
    format!("{}/{} available", book.available_copies, book.total_copies)
  } else {
    "none available".to_owned()
  };
  format!("#{:<5} {}  by {}  [{copies}]", book.id, book.title, book.author)
}

fn print_book(book: &Book) {
  println!("{}", book.title);
  println!("by {}", book.author);
  let fields = [
    ("genre", book.genre.clone()),
    ("year", book.year.map(|y| y.to_string())),
    ("isbn", book.isbn.clone()),
    ("rating", book.avg_rating.map(|r| format!("{r:.1} / 5"))),
  ];
  for (name, value) in fields {
    if let Some(value) = value {
      println!("{name:<10} {value}");
    }
  }
  println!("{:<10} {} of {}", "copies", book.available_copies, book.total_copies);
  for text in [&book.description, &book.ai_summary, &book.review_consensus]
    .into_iter()
    .flatten()
  {
    println!();
    println!("{text}");
  }
}

fn print_review(review: &Review) {
  let who = review
    .username
    .clone()
    .unwrap_or_else(|| format!("user #{}", review.user_id));
  println!(
    "  #{:<5} {who}  {}/5  {}",
    review.id,
    review.rating,
    review.created_at.format("%Y-%m-%d")
  );
  if let Some(text) = &review.text {
    println!("         {text}");
  }
}

fn default_download_name(book: &Book) -> PathBuf {
  book
    .file_path
    .as_deref()
    .and_then(|p| Path::new(p).file_name())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from(format!("book-{}", book.id)))
}

async fn attachment(path: &Path) -> Result<Attachment> {
  let bytes = tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;
  let file_name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| "upload".to_owned());
  Ok(Attachment {
    mime_type: mime_for(path).map(str::to_owned),
    file_name,
    bytes: bytes.into(),
  })
}

fn mime_for(path: &Path) -> Option<&'static str> {
  let ext = path.extension()?.to_str()?.to_ascii_lowercase();
  Some(match ext.as_str() {
    "pdf" => "application/pdf",
    "epub" => "application/epub+zip",
    "txt" => "text/plain",
    "jpg" | "jpeg" => "image/jpeg",
    "png" => "image/png",
    "gif" => "image/gif",
    "webp" => "image/webp",
    _ => return None,
  })
}

/// Read a password from stdin when it wasn't passed as a flag.
fn password_or_prompt(password: Option<String>) -> Result<String> {
  if let Some(p) = password {
    return Ok(p);
  }
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_owned())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use libris_client::{Gateway, GatewayConfig};
  use libris_core::{
    identity::Credential,
    token::{MemoryTokenStore, TokenStore},
  };
  use serde_json::json;
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
  };

  use super::*;

  fn book(file_path: Option<&str>) -> Book {
    serde_json::from_value(json!({
      "id": 3, "title": "Dune", "author": "Frank Herbert",
      "total_copies": 1, "available_copies": 0, "file_path": file_path
    }))
    .unwrap()
  }

  #[test]
  fn download_name_prefers_the_stored_file_name() {
    assert_eq!(
      default_download_name(&book(Some("uploads/books/dune.epub"))),
      PathBuf::from("dune.epub")
    );
    assert_eq!(default_download_name(&book(None)), PathBuf::from("book-3"));
  }

  #[test]
  fn mime_types_by_extension() {
    assert_eq!(mime_for(Path::new("a.PDF")), Some("application/pdf"));
    assert_eq!(mime_for(Path::new("cover.jpeg")), Some("image/jpeg"));
    assert_eq!(mime_for(Path::new("notes")), None);
  }

  #[test]
  fn book_fields_map_onto_a_partial_update() {
    let fields = BookFields {
      title:       None,
      author:      None,
      isbn:        None,
      year:        None,
      genre:       Some("Classics".into()),
      copies:      Some(2),
      description: None,
    };
    let update = BookUpdate::from(fields);
    assert_eq!(update.genre.as_deref(), Some("Classics"));
    assert_eq!(update.total_copies, Some(2));
    assert!(update.title.is_none());
  }

  #[tokio::test]
  async fn mutation_without_login_makes_no_request() {
    let server = MockServer::start().await;
    let session = SessionStore::new(Arc::new(MemoryTokenStore::new()));
    let client = LibraryClient::new(
      Gateway::with_session(GatewayConfig::new(server.uri()), session.clone(), || {}).unwrap(),
    );

    let err = run(Command::Borrow { book_id: 1 }, Invocation {
      client:  &client,
      session: &session,
      json:    false,
    })
    .await
    .unwrap_err();

    assert!(err.to_string().contains("not logged in"));
    assert!(server.received_requests().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn rejected_call_reports_the_server_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/borrows/9/return"))
      .respond_with(
        ResponseTemplate::new(400).set_body_json(json!({ "detail": "Already returned" })),
      )
      .mount(&server)
      .await;
    let storage = Arc::new(MemoryTokenStore::with_credential(Credential::new("t")));
    let session = SessionStore::new(storage.clone());
    session.load_from_storage();
    let client = LibraryClient::new(
      Gateway::with_session(GatewayConfig::new(server.uri()), session.clone(), || {}).unwrap(),
    );

    let err = run(Command::Return { borrow_id: 9 }, Invocation {
      client:  &client,
      session: &session,
      json:    true,
    })
    .await
    .unwrap_err();

    assert_eq!(err.to_string(), "Already returned");
    assert!(err.downcast_ref::<ApiError>().is_some());
    assert!(storage.load().unwrap().is_some());
  }

  #[tokio::test]
  async fn whoami_against_unreachable_server_forgets_the_login() {
    let uri = {
      let server = MockServer::start().await;
      server.uri()
    };
    let storage = Arc::new(MemoryTokenStore::with_credential(Credential::new("t")));
    let session = SessionStore::new(storage.clone());
    session.load_from_storage();
    let client = LibraryClient::new(
      Gateway::with_session(GatewayConfig::new(uri), session.clone(), || {}).unwrap(),
    );

    let err = run(Command::Whoami, Invocation {
      client:  &client,
      session: &session,
      json:    false,
    })
    .await
    .unwrap_err();

    assert!(matches!(err.downcast_ref::<ApiError>(), Some(ApiError::Transport(_))));
    assert!(storage.load().unwrap().is_none());
    assert!(!session.is_authenticated());
  }
}
