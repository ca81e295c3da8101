//! SQL schema for the credential store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- One row per named credential. The client only ever uses the 'token' key.
CREATE TABLE IF NOT EXISTS credentials (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    stored_at  TEXT NOT NULL    -- RFC 3339 UTC
);

PRAGMA user_version = 1;
";

/// The key under which the bearer credential is stored.
pub const TOKEN_KEY: &str = "token";
