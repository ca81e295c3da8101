//! [`SqliteTokenStore`]: the SQLite implementation of [`TokenStore`].

use std::{path::Path, sync::Mutex};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _};

use libris_core::{identity::Credential, token::TokenStore};

use crate::{
  Error, Result,
  encode::encode_dt,
  schema::{SCHEMA, TOKEN_KEY},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A credential store backed by a single SQLite file.
///
/// Every operation is one short statement, so the connection sits behind a
/// plain mutex rather than a dedicated worker thread.
pub struct SqliteTokenStore {
  conn: Mutex<Connection>,
}

impl SqliteTokenStore {
  /// Open (or create) a store at `path`, creating parent directories as
  /// needed, and run schema initialisation.
  pub fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    tracing::debug!(path = %path.display(), "opened credential store");
    Self::init(conn)
  }

  /// Open an in-memory store.
  pub fn open_in_memory() -> Result<Self> {
    Self::init(Connection::open_in_memory()?)
  }

  fn init(conn: Connection) -> Result<Self> {
    conn.execute_batch(SCHEMA)?;
    Ok(Self { conn: Mutex::new(conn) })
  }

  fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
    let conn = self.conn.lock().map_err(|_| Error::Poisoned)?;
    f(&conn)
  }

  /// Read the stored credential.
  pub fn get(&self) -> Result<Option<Credential>> {
    self.with_conn(|conn| {
      let value: Option<String> = conn
        .query_row(
          "SELECT value FROM credentials WHERE key = ?1",
          rusqlite::params![TOKEN_KEY],
          |r| r.get(0),
        )
        .optional()?;
      Ok(value.map(Credential::from))
    })
  }

  /// Store `credential`, replacing any previous value.
  pub fn put(&self, credential: &Credential) -> Result<()> {
    let value = credential.as_str().to_owned();
    let stored_at = encode_dt(Utc::now());
    self.with_conn(move |conn| {
      conn.execute(
        "INSERT INTO credentials (key, value, stored_at) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
           value     = excluded.value,
           stored_at = excluded.stored_at",
        rusqlite::params![TOKEN_KEY, value, stored_at],
      )?;
      Ok(())
    })
  }

  /// Delete the stored credential, if any.
  pub fn delete(&self) -> Result<()> {
    self.with_conn(|conn| {
      conn.execute(
        "DELETE FROM credentials WHERE key = ?1",
        rusqlite::params![TOKEN_KEY],
      )?;
      Ok(())
    })
  }
}

// ─── TokenStore impl ─────────────────────────────────────────────────────────

impl TokenStore for SqliteTokenStore {
  fn load(&self) -> libris_core::Result<Option<Credential>> { Ok(self.get()?) }

  fn save(&self, credential: &Credential) -> libris_core::Result<()> {
    Ok(self.put(credential)?)
  }

  fn clear(&self) -> libris_core::Result<()> { Ok(self.delete()?) }
}
