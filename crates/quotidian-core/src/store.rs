//! The `QuoteStore` trait and the settings keys it recognizes.
//!
//! The trait is implemented by storage backends (e.g.
//! `quotidian-store-sqlite`). Higher layers (`quotidian-api`, the selection
//! engine) depend on this abstraction, not on any concrete backend.

use std::{collections::HashSet, future::Future};

use chrono::NaiveDate;

use crate::quote::{CategoryFilter, Quote};

/// Keys in the flat `user_settings` table. Shape validation of values is the
/// caller's responsibility; the store treats everything as opaque strings.
pub mod keys {
  /// User-selected category filter ("all" or a category name).
  pub const CATEGORY: &str = "category";
  /// "true" / "false"; read by the notification scheduler, nothing else.
  pub const NOTIFICATIONS_ENABLED: &str = "notifications_enabled";
  /// Cache slot: the date (YYYY-MM-DD) the cached quote was chosen on.
  pub const TODAY_QUOTE_DATE: &str = "today_quote_date";
  /// Cache slot: the id of the quote chosen for that date.
  pub const TODAY_QUOTE_ID: &str = "today_quote_id";
}

/// Abstraction over a Quotidian storage backend.
///
/// The corpus is read-only at runtime (seeding aside); the history ledger is
/// append-only except for age-based pruning; settings are last-write-wins.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait QuoteStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Corpus ────────────────────────────────────────────────────────────

  /// Look up a quote by id. Returns `None` if not found.
  fn quote_by_id<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<Quote>, Self::Error>> + Send + 'a;

  /// All quotes matching `filter` whose ids are not in `excluded`.
  ///
  /// The category filter is applied in the query, before any randomness
  /// ever sees the set — callers must never sample-and-reject.
  fn eligible_quotes<'a>(
    &'a self,
    filter: CategoryFilter,
    excluded: &'a HashSet<String>,
  ) -> impl Future<Output = Result<Vec<Quote>, Self::Error>> + Send + 'a;

  /// Idempotent bulk insert, keyed by id: quotes whose id already exists
  /// are skipped. Returns the number of rows actually inserted.
  ///
  /// This is the one-time seeding contract; the engine never calls it.
  fn seed_quotes(
    &self,
    quotes: Vec<Quote>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── History ledger ────────────────────────────────────────────────────

  /// Ids of all quotes with a history row dated on or after `since`.
  fn recently_shown(
    &self,
    since: NaiveDate,
  ) -> impl Future<Output = Result<HashSet<String>, Self::Error>> + Send + '_;

  /// Append one history row. Never deduplicates or checks prior presence;
  /// the caller invokes this at most once per logical selection.
  fn record_shown<'a>(
    &'a self,
    quote_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete history rows with `shown_date <= cutoff`. Returns the number
  /// of rows deleted.
  fn prune_shown_on_or_before(
    &self,
    cutoff: NaiveDate,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Record `quote_id` as shown on `date` *and* point the day cache at it,
  /// as one atomic unit. A crash can never leave the quote excluded from
  /// future draws but missing from the cache.
  fn commit_selection<'a>(
    &'a self,
    quote_id: &'a str,
    date: NaiveDate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Settings ──────────────────────────────────────────────────────────

  /// Read a settings value. Returns `None` if the key was never written.
  fn setting<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Write a settings value, overwriting any previous one.
  fn put_setting<'a>(
    &'a self,
    key: &'a str,
    value: &'a str,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Delete the given settings keys. Missing keys are not an error.
  fn delete_settings<'a>(
    &'a self,
    keys: &'a [&'a str],
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}
