//! A small stateful stand-in for the library API, served by axum on an
//! ephemeral port. Enough of the real server's behaviour to check
//! read-after-write properties end to end.

#![allow(dead_code)]

use std::{
  collections::HashMap,
  sync::{Arc, Mutex},
};

use axum::{
  Form, Json, Router,
  extract::{Path, State},
  http::{HeaderMap, StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post},
};
use chrono::Utc;
use libris_client::{Gateway, GatewayConfig, LibraryClient};
use libris_core::{
  book::Book,
  borrow::Borrow,
  identity::{Identity, NewAccount},
  preferences::{PreferenceUpdate, Preferences},
  session::SessionStore,
  token::MemoryTokenStore,
};
use serde::Deserialize;
use serde_json::json;

// ─── State ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Db {
  users:       Vec<(Identity, String)>,
  books:       Vec<Book>,
  borrows:     Vec<Borrow>,
  preferences: HashMap<i64, Preferences>,
}

type Shared = Arc<Mutex<Db>>;

fn detail(status: StatusCode, msg: &str) -> Response {
  (status, Json(json!({ "detail": msg }))).into_response()
}

fn unauthorized() -> Response {
  detail(StatusCode::UNAUTHORIZED, "Could not validate credentials")
}

/// Tokens are simply `token-<user id>`.
fn current_user(db: &Db, headers: &HeaderMap) -> Option<Identity> {
  let id: i64 = headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer token-")?
    .parse()
    .ok()?;
  db.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())
}

pub fn seed_book(id: i64, title: &str, copies: i32) -> Book {
  Book {
    id,
    title: title.into(),
    author: "Frank Herbert".into(),
    isbn: None,
    description: None,
    genre: Some("Fiction".into()),
    year: Some(1965),
    total_copies: copies,
    available_copies: copies,
    file_path: None,
    cover_path: None,
    ai_summary: None,
    review_consensus: None,
    avg_rating: None,
    created_at: Some(Utc::now().naive_utc()),
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

async fn register(State(db): State<Shared>, Json(body): Json<NewAccount>) -> Response {
  let mut db = db.lock().unwrap();
  if db.users.iter().any(|(u, _)| u.username == body.username) {
    return detail(StatusCode::BAD_REQUEST, "Username already taken");
  }
  let user = Identity {
    id:         db.users.len() as i64 + 1,
    email:      body.email,
    username:   body.username,
    is_admin:   false,
    created_at: Some(Utc::now().naive_utc()),
  };
  db.users.push((user.clone(), body.password));
  (StatusCode::CREATED, Json(user)).into_response()
}

#[derive(Deserialize)]
struct LoginForm {
  username: String,
  password: String,
}

async fn login(State(db): State<Shared>, Form(form): Form<LoginForm>) -> Response {
  let db = db.lock().unwrap();
  match db
    .users
    .iter()
    .find(|(u, p)| u.username == form.username && *p == form.password)
  {
    Some((u, _)) => Json(json!({
      "access_token": format!("token-{}", u.id),
      "token_type": "bearer",
    }))
    .into_response(),
    None => detail(StatusCode::UNAUTHORIZED, "Invalid credentials"),
  }
}

async fn me(State(db): State<Shared>, headers: HeaderMap) -> Response {
  let db = db.lock().unwrap();
  match current_user(&db, &headers) {
    Some(u) => Json(u).into_response(),
    None => unauthorized(),
  }
}

async fn list_books(State(db): State<Shared>) -> Response {
  Json(db.lock().unwrap().books.clone()).into_response()
}

async fn get_book(State(db): State<Shared>, Path(id): Path<i64>) -> Response {
  let db = db.lock().unwrap();
  match db.books.iter().find(|b| b.id == id) {
    Some(b) => Json(b.clone()).into_response(),
    None => detail(StatusCode::NOT_FOUND, "Book not found"),
  }
}

async fn borrow(
  State(db): State<Shared>,
  headers: HeaderMap,
  Path(book_id): Path<i64>,
) -> Response {
  let mut db = db.lock().unwrap();
  let Some(user) = current_user(&db, &headers) else {
    return unauthorized();
  };
  let Some(book) = db.books.iter_mut().find(|b| b.id == book_id) else {
    return detail(StatusCode::NOT_FOUND, "Book not found");
  };
  if book.available_copies <= 0 {
    return detail(StatusCode::BAD_REQUEST, "No copies available");
  }
  book.available_copies -= 1;
  let title = book.title.clone();

  let record = Borrow {
    id:          db.borrows.len() as i64 + 1,
    user_id:     user.id,
    book_id,
    borrowed_at: Utc::now().naive_utc(),
    returned_at: None,
    is_returned: false,
    book_title:  Some(title),
  };
  db.borrows.push(record.clone());
  (StatusCode::CREATED, Json(record)).into_response()
}

async fn return_book(
  State(db): State<Shared>,
  headers: HeaderMap,
  Path(borrow_id): Path<i64>,
) -> Response {
  let mut db = db.lock().unwrap();
  let Some(user) = current_user(&db, &headers) else {
    return unauthorized();
  };
  let Some(record) = db.borrows.iter_mut().find(|b| b.id == borrow_id) else {
    return detail(StatusCode::NOT_FOUND, "Borrow record not found");
  };
  if record.user_id != user.id {
    return detail(StatusCode::FORBIDDEN, "Not your borrow");
  }
  if record.is_returned {
    return detail(StatusCode::BAD_REQUEST, "Already returned");
  }
  record.is_returned = true;
  record.returned_at = Some(Utc::now().naive_utc());
  let record = record.clone();

  if let Some(book) = db.books.iter_mut().find(|b| b.id == record.book_id) {
    book.available_copies += 1;
  }
  Json(record).into_response()
}

async fn my_borrows(State(db): State<Shared>, headers: HeaderMap) -> Response {
  let db = db.lock().unwrap();
  let Some(user) = current_user(&db, &headers) else {
    return unauthorized();
  };
  let mine: Vec<Borrow> = db
    .borrows
    .iter()
    .rev()
    .filter(|b| b.user_id == user.id)
    .cloned()
    .collect();
  Json(mine).into_response()
}

async fn get_preferences(State(db): State<Shared>, headers: HeaderMap) -> Response {
  let db = db.lock().unwrap();
  let Some(user) = current_user(&db, &headers) else {
    return unauthorized();
  };
  Json(db.preferences.get(&user.id).cloned().unwrap_or_default()).into_response()
}

#[derive(Deserialize)]
struct PreferenceBody {
  favorite_genres:  Option<String>,
  favorite_authors: Option<String>,
}

async fn put_preferences(
  State(db): State<Shared>,
  headers: HeaderMap,
  Json(body): Json<PreferenceBody>,
) -> Response {
  let mut db = db.lock().unwrap();
  let Some(user) = current_user(&db, &headers) else {
    return unauthorized();
  };
  let prefs = db.preferences.entry(user.id).or_default();
  if let Some(g) = body.favorite_genres {
    prefs.favorite_genres = g;
  }
  if let Some(a) = body.favorite_authors {
    prefs.favorite_authors = a;
  }
  Json(prefs.clone()).into_response()
}

// ─── Harness ──────────────────────────────────────────────────────────────────

/// Serve a fresh fake API with one seeded book (id 1, three copies) and
/// return its base URL.
pub async fn spawn_fake_api() -> String {
  let db = Db {
    books: vec![seed_book(1, "Dune", 3)],
    ..Db::default()
  };
  let app = Router::new()
    .route("/auth/register", post(register))
    .route("/auth/login", post(login))
    .route("/auth/me", get(me))
    .route("/books", get(list_books))
    .route("/books/{id}", get(get_book))
    .route("/borrows/me", get(my_borrows))
    .route("/borrows/{id}", post(borrow))
    .route("/borrows/{id}/return", post(return_book))
    .route("/preferences", get(get_preferences).put(put_preferences))
    .with_state(Arc::new(Mutex::new(db)));

  let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
  let addr = listener.local_addr().unwrap();
  tokio::spawn(async move {
    axum::serve(listener, app).await.unwrap();
  });
  format!("http://{addr}")
}

/// A client wired to a fresh in-memory session, counting login redirects.
pub struct Harness {
  pub client:    LibraryClient,
  pub session:   SessionStore,
  pub storage:   Arc<MemoryTokenStore>,
  pub redirects: Arc<std::sync::atomic::AtomicUsize>,
}

pub fn harness(base_url: &str) -> Harness {
  let storage = Arc::new(MemoryTokenStore::new());
  let session = SessionStore::new(storage.clone());
  let redirects = Arc::new(std::sync::atomic::AtomicUsize::new(0));
  let counter = redirects.clone();
  let gateway = Gateway::with_session(GatewayConfig::new(base_url), session.clone(), move || {
    counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
  })
  .unwrap();
  Harness {
    client: LibraryClient::new(gateway),
    session,
    storage,
    redirects,
  }
}

pub fn account(username: &str) -> NewAccount {
  NewAccount {
    email:    format!("{username}@example.com"),
    username: username.into(),
    password: "correct horse".into(),
  }
}

pub fn genres(value: &str) -> PreferenceUpdate {
  PreferenceUpdate {
    favorite_genres: Some(value.into()),
    ..PreferenceUpdate::default()
  }
}
