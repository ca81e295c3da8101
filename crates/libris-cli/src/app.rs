//! Application state machine and event dispatcher.
//!
//! Key handling never waits on the network. Every API call is spawned as a
//! tokio task that reports back with a [`Msg`]; the event loop drains those
//! between frames and feeds them to [`App::apply`].

use std::future::Future;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use libris_client::{ApiError, LibraryClient, Result, recommendations::DEFAULT_LIMIT};
use libris_core::{
  book::{Book, BookId, BookQuery},
  borrow::{self, Borrow},
  identity::{Identity, NewAccount},
  preferences::{PreferenceUpdate, Preferences},
  recommendation::Recommendation,
  review::{NewReview, Review},
  session::SessionStore,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::fetch::Fetch;

// ─── Screen ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
  Catalog,
  BookDetail,
  Borrows,
  Recommendations,
  Profile,
  Login,
}

impl Screen {
  /// Screens reachable from the header tabs, in key order `1`–`4`.
  pub const TABS: [Screen; 4] = [
    Screen::Catalog,
    Screen::Borrows,
    Screen::Recommendations,
    Screen::Profile,
  ];

  pub fn title(self) -> &'static str {
    match self {
      Screen::Catalog => "Catalog",
      Screen::BookDetail => "Book",
      Screen::Borrows => "My Books",
      Screen::Recommendations => "For You",
      Screen::Profile => "Profile",
      Screen::Login => "Login",
    }
  }
}

// ─── Messages ─────────────────────────────────────────────────────────────────

/// Results delivered back to the event loop by spawned API calls.
#[derive(Debug)]
pub enum Msg {
  Restored(Result<Option<Identity>>),
  Catalog(Result<Vec<Book>>),
  Book(BookId, Result<Book>),
  Reviews(BookId, Result<Vec<Review>>),
  Borrows(Result<Vec<Borrow>>),
  Recommendations(Result<Vec<Recommendation>>),
  Preferences(Result<Preferences>),
  Borrowed(BookId, Result<Borrow>),
  Returned(Result<Borrow>),
  ReviewPosted(BookId, Result<Review>),
  ReviewDeleted(BookId, Result<()>),
  PreferencesSaved(Result<Preferences>),
  SignedIn(Result<Identity>),
  /// Sent by the gateway after a 401 has cleared the session.
  LoginRequired,
}

// ─── Per-screen state ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogField {
  Search,
  Genre,
}

#[derive(Debug, Default)]
pub struct CatalogView {
  pub books:   Fetch<Vec<Book>>,
  pub search:  String,
  pub genre:   String,
  pub editing: Option<CatalogField>,
  pub cursor:  usize,
}

impl CatalogView {
  pub fn query(&self) -> BookQuery { BookQuery::from_filters(&self.search, &self.genre) }

  pub fn selected(&self) -> Option<&Book> { self.books.data()?.get(self.cursor) }
}

#[derive(Debug)]
pub struct DetailView {
  pub book_id:   Option<BookId>,
  pub book:      Fetch<Book>,
  pub reviews:   Fetch<Vec<Review>>,
  pub cursor:    usize,
  /// Whether the review form has keyboard focus.
  pub composing: bool,
  pub rating:    u8,
  pub text:      String,
}

impl Default for DetailView {
  fn default() -> Self {
    Self {
      book_id:   None,
      book:      Fetch::default(),
      reviews:   Fetch::default(),
      cursor:    0,
      composing: false,
      rating:    NewReview::default().rating,
      text:      String::new(),
    }
  }
}

impl DetailView {
  pub fn selected_review(&self) -> Option<&Review> { self.reviews.data()?.get(self.cursor) }

  fn draft(&self) -> NewReview {
    let text = self.text.trim();
    NewReview {
      rating: self.rating,
      text:   (!text.is_empty()).then(|| text.to_owned()),
    }
  }

  fn reset_draft(&mut self) {
    self.composing = false;
    self.rating = NewReview::default().rating;
    self.text.clear();
  }
}

#[derive(Debug, Default)]
pub struct BorrowsView {
  pub borrows: Fetch<Vec<Borrow>>,
  /// Index into the active (not yet returned) borrows.
  pub cursor:  usize,
}

impl BorrowsView {
  pub fn selected_active(&self) -> Option<&Borrow> {
    let (active, _) = borrow::partition(self.borrows.data()?);
    active.get(self.cursor).copied()
  }
}

#[derive(Debug, Default)]
pub struct RecommendationsView {
  pub recs:   Fetch<Vec<Recommendation>>,
  pub cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceField {
  Genres,
  Authors,
}

#[derive(Debug, Default)]
pub struct ProfileView {
  pub prefs:   Fetch<Preferences>,
  pub genres:  String,
  pub authors: String,
  pub editing: Option<PreferenceField>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
  #[default]
  SignIn,
  Register,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
  Email,
  Username,
  Password,
}

impl LoginMode {
  pub fn fields(self) -> &'static [LoginField] {
    match self {
      LoginMode::SignIn => &[LoginField::Username, LoginField::Password],
      LoginMode::Register => &[LoginField::Email, LoginField::Username, LoginField::Password],
    }
  }
}

#[derive(Debug, Default)]
pub struct LoginView {
  pub mode:     LoginMode,
  pub email:    String,
  pub username: String,
  pub password: String,
  /// Index into `mode.fields()`.
  pub focus:    usize,
  pub pending:  bool,
}

impl LoginView {
  pub fn focused(&self) -> LoginField {
    let fields = self.mode.fields();
    fields[self.focus.min(fields.len() - 1)]
  }

  pub fn value(&self, field: LoginField) -> &str {
    match field {
      LoginField::Email => &self.email,
      LoginField::Username => &self.username,
      LoginField::Password => &self.password,
    }
  }

  fn value_mut(&mut self, field: LoginField) -> &mut String {
    match field {
      LoginField::Email => &mut self.email,
      LoginField::Username => &mut self.username,
      LoginField::Password => &mut self.password,
    }
  }
}

// ─── App ──────────────────────────────────────────────────────────────────────

/// Top-level application state.
pub struct App {
  pub screen:     Screen,
  /// One-line status message shown in the status bar.
  pub status_msg: String,

  pub catalog: CatalogView,
  pub detail:  DetailView,
  pub borrows: BorrowsView,
  pub recs:    RecommendationsView,
  pub profile: ProfileView,
  pub login:   LoginView,

  pub session: SessionStore,
  client:      LibraryClient,
  tx:          UnboundedSender<Msg>,
}

impl App {
  pub fn new(client: LibraryClient, session: SessionStore, tx: UnboundedSender<Msg>) -> Self {
    Self {
      screen: Screen::Catalog,
      status_msg: String::new(),
      catalog: CatalogView::default(),
      detail: DetailView::default(),
      borrows: BorrowsView::default(),
      recs: RecommendationsView::default(),
      profile: ProfileView::default(),
      login: LoginView::default(),
      session,
      client,
      tx,
    }
  }

  /// Restore any stored login and load the catalog.
  pub fn start(&mut self) {
    let client = self.client.clone();
    let session = self.session.clone();
    self.spawn(async move { client.restore(&session).await }, Msg::Restored);
    self.open_catalog();
  }

  /// Direct link to a book's file on the server.
  pub fn download_url(&self, id: BookId) -> String { self.client.books().download_url(id) }

  fn spawn<F, T>(&self, fut: F, wrap: impl FnOnce(T) -> Msg + Send + 'static)
  where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
  {
    let tx = self.tx.clone();
    tokio::spawn(async move {
      let out = fut.await;
      // The receiver only goes away on shutdown.
      let _ = tx.send(wrap(out));
    });
  }

  /// Surface an API failure. 401s are left alone: the gateway has already
  /// queued the redirect to the login screen.
  fn report(&mut self, err: &ApiError) {
    if !err.is_unauthorized() {
      self.status_msg = err.user_message();
    }
  }

  /// Gate for mutations: unauthenticated users go to the login screen and
  /// no request is made.
  fn require_login(&mut self) -> bool {
    if self.session.is_authenticated() {
      return true;
    }
    self.show_login("Please log in first");
    false
  }

  fn show_login(&mut self, message: &str) {
    self.screen = Screen::Login;
    self.login.pending = false;
    self.status_msg = message.to_owned();
  }

  // ── Fetches ───────────────────────────────────────────────────────────────

  fn open_catalog(&mut self) {
    self.screen = Screen::Catalog;
    self.refresh_catalog();
  }

  fn refresh_catalog(&mut self) {
    self.catalog.books.begin();
    let client = self.client.clone();
    let query = self.catalog.query();
    self.spawn(async move { client.books().list(&query).await }, Msg::Catalog);
  }

  fn open_book(&mut self, id: BookId) {
    if self.detail.book_id != Some(id) {
      self.detail = DetailView {
        book_id: Some(id),
        ..DetailView::default()
      };
    }
    self.screen = Screen::BookDetail;
    self.refresh_book(id);
    self.refresh_reviews(id);
  }

  fn refresh_book(&mut self, id: BookId) {
    self.detail.book.begin();
    let client = self.client.clone();
    self.spawn(async move { client.books().get(id).await }, move |r| {
      Msg::Book(id, r)
    });
  }

  fn refresh_reviews(&mut self, id: BookId) {
    self.detail.reviews.begin();
    let client = self.client.clone();
    self.spawn(async move { client.reviews().for_book(id).await }, move |r| {
      Msg::Reviews(id, r)
    });
  }

  fn open_borrows(&mut self) {
    self.screen = Screen::Borrows;
    self.refresh_borrows();
  }

  fn refresh_borrows(&mut self) {
    self.borrows.borrows.begin();
    let client = self.client.clone();
    self.spawn(async move { client.borrows().mine().await }, Msg::Borrows);
  }

  fn open_recommendations(&mut self) {
    self.screen = Screen::Recommendations;
    self.recs.recs.begin();
    let client = self.client.clone();
    self.spawn(
      async move { client.recommendations().get(DEFAULT_LIMIT).await },
      Msg::Recommendations,
    );
  }

  fn open_profile(&mut self) {
    self.screen = Screen::Profile;
    if self.session.is_authenticated() {
      self.refresh_preferences();
    }
  }

  fn refresh_preferences(&mut self) {
    self.profile.prefs.begin();
    let client = self.client.clone();
    self.spawn(async move { client.preferences().get().await }, Msg::Preferences);
  }

  // ── Mutations ─────────────────────────────────────────────────────────────

  fn borrow(&mut self, book_id: BookId) {
    if !self.require_login() {
      return;
    }
    let client = self.client.clone();
    self.spawn(async move { client.borrows().borrow(book_id).await }, move |r| {
      Msg::Borrowed(book_id, r)
    });
  }

  fn return_selected(&mut self) {
    let Some(borrow_id) = self.borrows.selected_active().map(|b| b.id) else {
      return;
    };
    if !self.require_login() {
      return;
    }
    let client = self.client.clone();
    self.spawn(
      async move { client.borrows().return_book(borrow_id).await },
      Msg::Returned,
    );
  }

  fn post_review(&mut self) {
    let Some(book_id) = self.detail.book_id else {
      return;
    };
    if !self.require_login() {
      return;
    }
    let draft = self.detail.draft();
    let client = self.client.clone();
    self.spawn(
      async move { client.reviews().create(book_id, &draft).await },
      move |r| Msg::ReviewPosted(book_id, r),
    );
  }

  fn delete_selected_review(&mut self) {
    let Some(book_id) = self.detail.book_id else {
      return;
    };
    let Some(review) = self.detail.selected_review() else {
      return;
    };
    let (review_id, author) = (review.id, review.user_id);
    if !self.require_login() {
      return;
    }
    let own = self.session.snapshot().user.is_some_and(|u| u.id == author);
    if !own {
      self.status_msg = "You can only delete your own reviews".into();
      return;
    }
    let client = self.client.clone();
    self.spawn(
      async move { client.reviews().delete(review_id).await },
      move |r| Msg::ReviewDeleted(book_id, r),
    );
  }

  fn save_preferences(&mut self) {
    if !self.require_login() {
      return;
    }
    // The form only holds the user's values once a read has landed.
    if self.profile.prefs.data().is_none() {
      self.status_msg = "Preferences have not loaded yet; press r to retry".into();
      return;
    }
    let update = PreferenceUpdate {
      favorite_genres:  Some(self.profile.genres.clone()),
      favorite_authors: Some(self.profile.authors.clone()),
    };
    let client = self.client.clone();
    self.spawn(
      async move { client.preferences().update(&update).await },
      Msg::PreferencesSaved,
    );
  }

  fn submit_login(&mut self) {
    if self.login.pending {
      return;
    }
    let missing = self
      .login
      .mode
      .fields()
      .iter()
      .any(|f| self.login.value(*f).is_empty());
    if missing {
      self.status_msg = "Please fill in every field".into();
      return;
    }

    self.login.pending = true;
    let client = self.client.clone();
    let session = self.session.clone();
    match self.login.mode {
      LoginMode::SignIn => {
        let (username, password) = (self.login.username.clone(), self.login.password.clone());
        self.spawn(
          async move { client.sign_in(&session, &username, &password).await },
          Msg::SignedIn,
        );
      }
      LoginMode::Register => {
        let account = NewAccount {
          email:    self.login.email.clone(),
          username: self.login.username.clone(),
          password: self.login.password.clone(),
        };
        self.spawn(
          async move { client.sign_up(&session, &account).await },
          Msg::SignedIn,
        );
      }
    }
  }

  fn sign_out(&mut self) {
    self.session.logout();
    self.clear_account_views();
    self.status_msg = "Signed out".into();
  }

  /// Drop everything fetched on behalf of the previous account.
  fn clear_account_views(&mut self) {
    self.profile = ProfileView::default();
    self.borrows = BorrowsView::default();
    self.recs = RecommendationsView::default();
  }

  // ── Message handling ──────────────────────────────────────────────────────

  /// Apply a result delivered by a spawned call. Responses land in arrival
  /// order, so a slow earlier fetch can overwrite a faster later one.
  pub fn apply(&mut self, msg: Msg) {
    match msg {
      Msg::Restored(Ok(Some(user))) => {
        self.status_msg = format!("Signed in as {}", user.username);
        if self.screen == Screen::Profile {
          self.refresh_preferences();
        }
      }
      Msg::Restored(Ok(None)) => {}
      Msg::Restored(Err(e)) => self.report(&e),

      Msg::Catalog(result) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.catalog.books.resolve(result);
        let len = self.catalog.books.data().map_or(0, Vec::len);
        self.catalog.cursor = self.catalog.cursor.min(len.saturating_sub(1));
      }

      // A response for a book that is no longer open has nowhere to go.
      Msg::Book(id, result) if self.detail.book_id == Some(id) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.detail.book.resolve(result);
      }
      Msg::Reviews(id, result) if self.detail.book_id == Some(id) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.detail.reviews.resolve(result);
        let len = self.detail.reviews.data().map_or(0, Vec::len);
        self.detail.cursor = self.detail.cursor.min(len.saturating_sub(1));
      }
      Msg::Book(..) | Msg::Reviews(..) => {}

      Msg::Borrows(result) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.borrows.borrows.resolve(result);
        let active = self
          .borrows
          .borrows
          .data()
          .map_or(0, |all| borrow::partition(all).0.len());
        self.borrows.cursor = self.borrows.cursor.min(active.saturating_sub(1));
      }

      Msg::Recommendations(result) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.recs.recs.resolve(result);
      }

      Msg::Preferences(result) => {
        if let Err(e) = &result {
          self.report(e);
        }
        self.profile.prefs.resolve(result);
        if self.profile.editing.is_none() {
          if let Some(prefs) = self.profile.prefs.data() {
            self.profile.genres = prefs.favorite_genres.clone();
            self.profile.authors = prefs.favorite_authors.clone();
          }
        }
      }

      Msg::Borrowed(book_id, Ok(_)) => {
        self.status_msg = "Book borrowed successfully!".into();
        self.refresh_catalog();
        if self.detail.book_id == Some(book_id) {
          self.refresh_book(book_id);
        }
      }
      Msg::Borrowed(_, Err(e)) => self.report(&e),

      Msg::Returned(Ok(record)) => {
        self.status_msg = format!("Returned {}", record.title());
        self.refresh_borrows();
      }
      Msg::Returned(Err(e)) => self.report(&e),

      Msg::ReviewPosted(book_id, Ok(_)) => {
        self.status_msg = "Review posted".into();
        if self.detail.book_id == Some(book_id) {
          self.detail.reset_draft();
          self.refresh_reviews(book_id);
          self.refresh_book(book_id);
        }
      }
      Msg::ReviewPosted(_, Err(e)) => self.report(&e),

      Msg::ReviewDeleted(book_id, Ok(())) => {
        self.status_msg = "Review deleted".into();
        if self.detail.book_id == Some(book_id) {
          self.refresh_reviews(book_id);
          self.refresh_book(book_id);
        }
      }
      Msg::ReviewDeleted(_, Err(e)) => self.report(&e),

      Msg::PreferencesSaved(Ok(_)) => {
        self.status_msg = "Saved!".into();
        self.refresh_preferences();
      }
      Msg::PreferencesSaved(Err(e)) => self.report(&e),

      Msg::SignedIn(Ok(user)) => {
        self.login = LoginView {
          mode: self.login.mode,
          ..LoginView::default()
        };
        self.status_msg = format!("Welcome, {}", user.username);
        self.clear_account_views();
        self.open_catalog();
      }
      Msg::SignedIn(Err(e)) => {
        self.login.pending = false;
        self.login.password.clear();
        self.status_msg = e.user_message();
      }

      Msg::LoginRequired => {
        if self.screen != Screen::Login {
          self.show_login("Please log in to continue");
        }
      }
    }
  }

  // ── Key handling ──────────────────────────────────────────────────────────

  /// Process a key event. Returns `true` to continue, `false` to quit.
  pub fn handle_key(&mut self, key: KeyEvent) -> bool {
    // Global: Ctrl-C quits from anywhere.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
      return false;
    }

    if self.screen == Screen::Login {
      self.handle_login_key(key);
      return true;
    }
    match (self.screen, self.catalog.editing, self.profile.editing) {
      (Screen::Catalog, Some(field), _) => {
        self.handle_filter_key(field, key);
        return true;
      }
      (Screen::BookDetail, ..) if self.detail.composing => {
        self.handle_review_key(key);
        return true;
      }
      (Screen::Profile, _, Some(field)) => {
        self.handle_preference_key(field, key);
        return true;
      }
      _ => {}
    }

    match key.code {
      KeyCode::Char('q') => return false,
      KeyCode::Char('1') => self.open_catalog(),
      KeyCode::Char('2') => self.open_borrows(),
      KeyCode::Char('3') => self.open_recommendations(),
      KeyCode::Char('4') => self.open_profile(),
      KeyCode::Char('i') => self.show_login(""),
      KeyCode::Char('o') if self.session.is_authenticated() => self.sign_out(),
      _ => match self.screen {
        Screen::Catalog => self.handle_catalog_key(key),
        Screen::BookDetail => self.handle_detail_key(key),
        Screen::Borrows => self.handle_borrows_key(key),
        Screen::Recommendations => self.handle_recommendations_key(key),
        Screen::Profile => self.handle_profile_key(key),
        Screen::Login => {}
      },
    }
    true
  }

  fn handle_catalog_key(&mut self, key: KeyEvent) {
    let len = self.catalog.books.data().map_or(0, Vec::len);
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.catalog.cursor, len),
      KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.catalog.cursor),
      KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
        if let Some(id) = self.catalog.selected().map(|b| b.id) {
          self.open_book(id);
        }
      }
      KeyCode::Char('b') => {
        if let Some(id) = self.catalog.selected().map(|b| b.id) {
          self.borrow(id);
        }
      }
      KeyCode::Char('/') => self.catalog.editing = Some(CatalogField::Search),
      KeyCode::Char('g') => self.catalog.editing = Some(CatalogField::Genre),
      KeyCode::Char('r') => self.refresh_catalog(),
      _ => {}
    }
  }

  fn handle_filter_key(&mut self, field: CatalogField, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Enter => self.catalog.editing = None,
      KeyCode::Tab => {
        self.catalog.editing = Some(match field {
          CatalogField::Search => CatalogField::Genre,
          CatalogField::Genre => CatalogField::Search,
        });
      }
      code => {
        let buf = match field {
          CatalogField::Search => &mut self.catalog.search,
          CatalogField::Genre => &mut self.catalog.genre,
        };
        if edit(buf, code) {
          self.catalog.cursor = 0;
          self.refresh_catalog();
        }
      }
    }
  }

  fn handle_detail_key(&mut self, key: KeyEvent) {
    let Some(book_id) = self.detail.book_id else {
      return;
    };
    let len = self.detail.reviews.data().map_or(0, Vec::len);
    match key.code {
      KeyCode::Esc | KeyCode::Left | KeyCode::Char('h') => self.screen = Screen::Catalog,
      KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.detail.cursor, len),
      KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.detail.cursor),
      KeyCode::Char('b') => self.borrow(book_id),
      KeyCode::Char('w') => {
        if self.require_login() {
          self.detail.composing = true;
        }
      }
      KeyCode::Char('d') => self.delete_selected_review(),
      KeyCode::Char('r') => {
        self.refresh_book(book_id);
        self.refresh_reviews(book_id);
      }
      _ => {}
    }
  }

  fn handle_review_key(&mut self, key: KeyEvent) {
    match key.code {
      KeyCode::Esc => self.detail.reset_draft(),
      KeyCode::Enter => self.post_review(),
      KeyCode::Up | KeyCode::Right => self.detail.rating = (self.detail.rating + 1).min(5),
      KeyCode::Down | KeyCode::Left => self.detail.rating = self.detail.rating.saturating_sub(1).max(1),
      code => {
        edit(&mut self.detail.text, code);
      }
    }
  }

  fn handle_borrows_key(&mut self, key: KeyEvent) {
    let active = self
      .borrows
      .borrows
      .data()
      .map_or(0, |all| borrow::partition(all).0.len());
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.borrows.cursor, active),
      KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.borrows.cursor),
      KeyCode::Enter | KeyCode::Char('t') => self.return_selected(),
      KeyCode::Char('r') => self.refresh_borrows(),
      _ => {}
    }
  }

  fn handle_recommendations_key(&mut self, key: KeyEvent) {
    let len = self.recs.recs.data().map_or(0, Vec::len);
    match key.code {
      KeyCode::Down | KeyCode::Char('j') => step_down(&mut self.recs.cursor, len),
      KeyCode::Up | KeyCode::Char('k') => step_up(&mut self.recs.cursor),
      KeyCode::Enter => {
        let id = self
          .recs
          .recs
          .data()
          .and_then(|r| r.get(self.recs.cursor))
          .map(|r| r.book.id);
        if let Some(id) = id {
          self.open_book(id);
        }
      }
      KeyCode::Char('r') => self.open_recommendations(),
      _ => {}
    }
  }

  fn handle_profile_key(&mut self, key: KeyEvent) {
    if !self.session.is_authenticated() {
      return;
    }
    match key.code {
      KeyCode::Char('g') => self.profile.editing = Some(PreferenceField::Genres),
      KeyCode::Char('a') => self.profile.editing = Some(PreferenceField::Authors),
      KeyCode::Char('s') => self.save_preferences(),
      KeyCode::Char('r') => self.refresh_preferences(),
      _ => {}
    }
  }

  fn handle_preference_key(&mut self, field: PreferenceField, key: KeyEvent) {
    match key.code {
      KeyCode::Esc | KeyCode::Enter => self.profile.editing = None,
      KeyCode::Tab => {
        self.profile.editing = Some(match field {
          PreferenceField::Genres => PreferenceField::Authors,
          PreferenceField::Authors => PreferenceField::Genres,
        });
      }
      code => {
        let buf = match field {
          PreferenceField::Genres => &mut self.profile.genres,
          PreferenceField::Authors => &mut self.profile.authors,
        };
        edit(buf, code);
      }
    }
  }

  fn handle_login_key(&mut self, key: KeyEvent) {
    let count = self.login.mode.fields().len();
    match key.code {
      KeyCode::Esc => self.open_catalog(),
      KeyCode::Enter => self.submit_login(),
      KeyCode::Tab | KeyCode::Down => self.login.focus = (self.login.focus + 1) % count,
      KeyCode::BackTab | KeyCode::Up => self.login.focus = (self.login.focus + count - 1) % count,
      KeyCode::F(2) => {
        self.login.mode = match self.login.mode {
          LoginMode::SignIn => LoginMode::Register,
          LoginMode::Register => LoginMode::SignIn,
        };
        self.login.focus = 0;
      }
      code => {
        let field = self.login.focused();
        edit(self.login.value_mut(field), code);
      }
    }
  }
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

/// Apply a text-editing key to `buf`. Returns whether the text changed.
fn edit(buf: &mut String, code: KeyCode) -> bool {
  match code {
    KeyCode::Char(c) => {
      buf.push(c);
      true
    }
    KeyCode::Backspace => buf.pop().is_some(),
    _ => false,
  }
}

fn step_down(cursor: &mut usize, len: usize) {
  if len > 0 && *cursor + 1 < len {
    *cursor += 1;
  }
}

fn step_up(cursor: &mut usize) { *cursor = cursor.saturating_sub(1); }

#[cfg(test)]
mod tests {
  use std::{sync::Arc, time::Duration};

  use libris_client::{Gateway, GatewayConfig};
  use libris_core::{identity::Credential, token::MemoryTokenStore};
  use serde_json::json;
  use tokio::sync::mpsc::{self, UnboundedReceiver};
  use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, method, path, query_param},
  };

  use super::*;

  fn press(code: KeyCode) -> KeyEvent { KeyEvent::new(code, KeyModifiers::NONE) }

  fn book_json(id: i64, available: i32) -> serde_json::Value {
    json!({
      "id": id, "title": "Dune", "author": "Frank Herbert",
      "total_copies": 3, "available_copies": available,
      "created_at": "2024-01-01T00:00:00"
    })
  }

  fn book(id: i64) -> Book { serde_json::from_value(book_json(id, 3)).unwrap() }

  fn borrow_json(returned: bool) -> serde_json::Value {
    let returned_at = returned.then_some("2024-02-08T10:00:00");
    json!({
      "id": 5, "user_id": 7, "book_id": 1,
      "borrowed_at": "2024-02-01T10:00:00", "returned_at": returned_at,
      "is_returned": returned, "book_title": "Dune"
    })
  }

  fn prefs_json(genres: &str, authors: &str) -> serde_json::Value {
    json!({ "favorite_genres": genres, "favorite_authors": authors })
  }

  fn app(server: &MockServer) -> (App, UnboundedReceiver<Msg>) {
    app_with(server, MemoryTokenStore::new())
  }

  fn app_with(server: &MockServer, storage: MemoryTokenStore) -> (App, UnboundedReceiver<Msg>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let session = SessionStore::new(Arc::new(storage));
    let redirect = tx.clone();
    let gateway = Gateway::with_session(GatewayConfig::new(server.uri()), session.clone(), move || {
      let _ = redirect.send(Msg::LoginRequired);
    })
    .unwrap();
    (App::new(LibraryClient::new(gateway), session, tx), rx)
  }

  fn sign_in(app: &App) {
    app.session.set_auth(
      Identity {
        id:         7,
        email:      "ann@example.com".into(),
        username:   "ann".into(),
        is_admin:   false,
        created_at: None,
      },
      Credential::new("token-7"),
    );
  }

  async fn next(rx: &mut UnboundedReceiver<Msg>) -> Msg {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
      .await
      .expect("message within timeout")
      .expect("channel open")
  }

  #[tokio::test]
  async fn unauthenticated_borrow_goes_to_login_without_a_request() {
    let server = MockServer::start().await;
    let (mut app, _rx) = app(&server);
    app.catalog.books = Fetch::Loaded(vec![book(1)]);

    assert!(app.handle_key(press(KeyCode::Char('b'))));

    assert_eq!(app.screen, Screen::Login);
    tokio::task::yield_now().await;
    assert!(server.received_requests().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn every_search_edit_refetches_the_catalog() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/books"))
      .and(query_param("search", "d"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([book_json(1, 3)])))
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);

    app.handle_key(press(KeyCode::Char('/')));
    app.handle_key(press(KeyCode::Char('d')));
    assert!(app.catalog.books.is_loading());

    let msg = next(&mut rx).await;
    app.apply(msg);
    assert_eq!(app.catalog.books.data().map(Vec::len), Some(1));
    assert_eq!(app.catalog.search, "d");
  }

  #[tokio::test]
  async fn borrow_is_followed_by_a_fresh_catalog_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/borrows/1"))
      .respond_with(ResponseTemplate::new(201).set_body_json(json!({
        "id": 5, "user_id": 7, "book_id": 1,
        "borrowed_at": "2024-02-01T10:00:00", "returned_at": null,
        "is_returned": false, "book_title": "Dune"
      })))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([book_json(1, 2)])))
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);
    app.catalog.books = Fetch::Loaded(vec![book(1)]);

    app.handle_key(press(KeyCode::Char('b')));
    let borrowed = next(&mut rx).await;
    assert!(matches!(borrowed, Msg::Borrowed(1, Ok(_))));
    app.apply(borrowed);
    assert_eq!(app.status_msg, "Book borrowed successfully!");
    assert!(app.catalog.books.is_loading());

    let refreshed = next(&mut rx).await;
    app.apply(refreshed);
    let books = app.catalog.books.data().unwrap();
    assert_eq!(books[0].available_copies, 2);
  }

  #[tokio::test]
  async fn return_is_followed_by_a_fresh_borrows_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/borrows/5/return"))
      .respond_with(ResponseTemplate::new(200).set_body_json(borrow_json(true)))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/borrows/me"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([borrow_json(true)])))
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);
    app.screen = Screen::Borrows;
    app.borrows.borrows = Fetch::Loaded(vec![serde_json::from_value(borrow_json(false)).unwrap()]);

    app.handle_key(press(KeyCode::Char('t')));
    let returned = next(&mut rx).await;
    assert!(matches!(returned, Msg::Returned(Ok(_))));
    app.apply(returned);
    assert_eq!(app.status_msg, "Returned Dune");
    assert!(app.borrows.borrows.is_loading());

    let refreshed = next(&mut rx).await;
    app.apply(refreshed);
    assert!(app.borrows.selected_active().is_none());
    assert!(app.borrows.borrows.data().unwrap()[0].is_returned);
  }

  #[tokio::test]
  async fn posted_review_is_followed_by_fresh_reviews_and_book() {
    let server = MockServer::start().await;
    let review = json!({
      "id": 11, "user_id": 7, "book_id": 1, "rating": 4,
      "text": "Spice.", "created_at": "2024-03-01T00:00:00"
    });
    Mock::given(method("POST"))
      .and(path("/reviews/book/1"))
      .and(body_json(json!({ "rating": 4, "text": "Spice." })))
      .respond_with(ResponseTemplate::new(201).set_body_json(review.clone()))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/reviews/book/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([review])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/books/1"))
      .respond_with(ResponseTemplate::new(200).set_body_json(book_json(1, 3)))
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);
    app.screen = Screen::BookDetail;
    app.detail = DetailView {
      book_id: Some(1),
      composing: true,
      rating: 4,
      text: "Spice.".into(),
      ..DetailView::default()
    };

    app.handle_key(press(KeyCode::Enter));
    let posted = next(&mut rx).await;
    assert!(matches!(posted, Msg::ReviewPosted(1, Ok(_))));
    app.apply(posted);
    assert!(!app.detail.composing);
    assert!(app.detail.text.is_empty());
    assert!(app.detail.reviews.is_loading());
    assert!(app.detail.book.is_loading());

    for _ in 0..2 {
      let msg = next(&mut rx).await;
      app.apply(msg);
    }
    assert_eq!(app.detail.reviews.data().map(Vec::len), Some(1));
    assert_eq!(app.detail.book.data().map(|b| b.id), Some(1));
  }

  #[tokio::test]
  async fn saved_preferences_are_followed_by_a_fresh_read() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
      .and(path("/preferences"))
      .and(body_json(prefs_json("Poetry", "Le Guin")))
      .respond_with(ResponseTemplate::new(200).set_body_json(prefs_json("Poetry", "Le Guin")))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/preferences"))
      .respond_with(ResponseTemplate::new(200).set_body_json(prefs_json("Poetry", "Le Guin")))
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);
    app.screen = Screen::Profile;
    app.profile.prefs = Fetch::Loaded(Preferences {
      favorite_genres:  "Fiction".into(),
      favorite_authors: "Le Guin".into(),
    });
    app.profile.genres = "Poetry".into();
    app.profile.authors = "Le Guin".into();

    app.handle_key(press(KeyCode::Char('s')));
    let saved = next(&mut rx).await;
    assert!(matches!(saved, Msg::PreferencesSaved(Ok(_))));
    app.apply(saved);
    assert_eq!(app.status_msg, "Saved!");
    assert!(app.profile.prefs.is_loading());

    let refreshed = next(&mut rx).await;
    app.apply(refreshed);
    assert_eq!(app.profile.prefs.data().map(|p| p.favorite_genres.as_str()), Some("Poetry"));
  }

  #[tokio::test]
  async fn profile_fetches_preferences_on_entry_when_signed_in() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/preferences"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(prefs_json("Fiction, History", "Le Guin")),
      )
      .expect(1)
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);

    app.handle_key(press(KeyCode::Char('4')));
    assert_eq!(app.screen, Screen::Profile);
    assert!(app.profile.prefs.is_loading());

    let msg = next(&mut rx).await;
    app.apply(msg);
    assert_eq!(app.profile.genres, "Fiction, History");
    assert_eq!(app.profile.authors, "Le Guin");
  }

  #[tokio::test]
  async fn profile_opened_before_restore_loads_once_the_login_is_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/auth/me"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({
        "id": 7, "email": "ann@example.com", "username": "ann"
      })))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/books"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/preferences"))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(prefs_json("Fiction, History", "Le Guin")),
      )
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("PUT"))
      .and(path("/preferences"))
      .respond_with(ResponseTemplate::new(200).set_body_json(prefs_json("", "")))
      .expect(0)
      .mount(&server)
      .await;
    let storage = MemoryTokenStore::with_credential(Credential::new("token-7"));
    let (mut app, mut rx) = app_with(&server, storage);

    app.start();
    app.handle_key(press(KeyCode::Char('4')));
    assert!(!app.session.is_authenticated());

    // Restored and Catalog, in whichever order they finish. Nothing else is
    // spawned until they are applied.
    let (first, second) = (next(&mut rx).await, next(&mut rx).await);
    app.apply(first);
    app.apply(second);
    assert!(app.session.is_authenticated());
    assert!(app.profile.prefs.is_loading());

    // An empty form must not be saved over the server's values.
    app.handle_key(press(KeyCode::Char('s')));
    assert_eq!(app.status_msg, "Preferences have not loaded yet; press r to retry");

    let msg = next(&mut rx).await;
    assert!(matches!(msg, Msg::Preferences(Ok(_))));
    app.apply(msg);
    assert_eq!(app.profile.genres, "Fiction, History");
    assert_eq!(app.profile.authors, "Le Guin");
  }

  #[tokio::test]
  async fn save_is_refused_when_preferences_never_loaded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/preferences"))
      .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "detail": "boom" })))
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);

    app.handle_key(press(KeyCode::Char('4')));
    let msg = next(&mut rx).await;
    app.apply(msg);
    assert_eq!(app.profile.prefs.error(), Some("boom"));

    app.handle_key(press(KeyCode::Char('s')));
    tokio::task::yield_now().await;

    assert_eq!(app.status_msg, "Preferences have not loaded yet; press r to retry");
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "PUT"));
  }

  #[tokio::test]
  async fn rejected_mutation_surfaces_detail_in_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/borrows/1"))
      .respond_with(
        ResponseTemplate::new(400).set_body_json(json!({ "detail": "No copies available" })),
      )
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);
    app.catalog.books = Fetch::Loaded(vec![book(1)]);

    app.handle_key(press(KeyCode::Char('b')));
    let msg = next(&mut rx).await;
    app.apply(msg);

    assert_eq!(app.status_msg, "No copies available");
    assert_eq!(app.screen, Screen::Catalog);
  }

  #[tokio::test]
  async fn unauthorized_response_redirects_to_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .and(path("/borrows/me"))
      .respond_with(
        ResponseTemplate::new(401).set_body_json(json!({ "detail": "Not authenticated" })),
      )
      .mount(&server)
      .await;
    let (mut app, mut rx) = app(&server);
    sign_in(&app);

    app.handle_key(press(KeyCode::Char('2')));
    assert_eq!(app.screen, Screen::Borrows);

    let redirect = next(&mut rx).await;
    assert!(matches!(redirect, Msg::LoginRequired));
    app.apply(redirect);
    let failed = next(&mut rx).await;
    app.apply(failed);

    assert_eq!(app.screen, Screen::Login);
    assert!(!app.session.is_authenticated());
    assert_eq!(app.status_msg, "Please log in to continue");
  }

  #[tokio::test]
  async fn stale_book_response_is_dropped() {
    let server = MockServer::start().await;
    let (mut app, _rx) = app(&server);
    app.detail.book_id = Some(2);

    app.apply(Msg::Book(1, Ok(book(1))));
    assert!(app.detail.book.data().is_none());

    app.apply(Msg::Book(2, Ok(book(2))));
    assert_eq!(app.detail.book.data().map(|b| b.id), Some(2));
  }

  #[test]
  fn blank_review_text_is_omitted() {
    let mut view = DetailView::default();
    assert_eq!(view.rating, 5);
    view.text = "  ".into();
    assert_eq!(view.draft().text, None);
    view.text = " Spice. ".into();
    assert_eq!(view.draft().text.as_deref(), Some("Spice."));
  }
}
