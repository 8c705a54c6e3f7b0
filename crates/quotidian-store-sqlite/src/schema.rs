//! SQL schema for the Quotidian SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- The corpus. Read-only at runtime; populated once by the seeding contract.
CREATE TABLE IF NOT EXISTS quotes (
    id       TEXT PRIMARY KEY,
    text     TEXT NOT NULL,
    author   TEXT,            -- NULL for anonymous quotes
    category TEXT NOT NULL    -- 'motivational' | 'demotivational' | 'funny' | 'fun_facts'
);

-- Selection history is append-only.
-- Rows only ever leave via age-based pruning.
CREATE TABLE IF NOT EXISTS quote_history (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    quote_id   TEXT NOT NULL REFERENCES quotes(id),
    shown_date TEXT NOT NULL  -- local calendar date, YYYY-MM-DD
);

-- Flat key/value settings, including the two day-cache keys.
CREATE TABLE IF NOT EXISTS user_settings (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS quote_history_quote_idx ON quote_history(quote_id);
CREATE INDEX IF NOT EXISTS quote_history_date_idx  ON quote_history(shown_date);

PRAGMA user_version = 1;
";
