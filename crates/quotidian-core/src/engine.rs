//! [`SelectionEngine`] — cache-or-draw orchestration over a [`QuoteStore`].
//!
//! The engine owns the three invariants that matter: a quote never repeats
//! within the exclusion window, repeated requests on the same calendar day
//! return the identical quote, and a committed choice survives restarts.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use rand::Rng as _;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::{
  clock::{Clock, LocalClock},
  quote::{CategoryFilter, Quote},
  store::{QuoteStore, keys},
};

/// Days within which a previously shown quote may not repeat.
pub const EXCLUSION_WINDOW_DAYS: u64 = 365;

/// Age beyond which history rows are pruned. Kept larger than the exclusion
/// window so pruning never removes a row still inside the active horizon.
pub const RETENTION_DAYS: u64 = 400;

// ─── Error ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum EngineError<E> {
  /// Every quote matching the filter was shown within the exclusion window.
  /// No writes were performed. Recoverable by broadening the category or
  /// waiting for the window to advance; never retried automatically.
  #[error("no eligible quote for category {0}")]
  Exhausted(CategoryFilter),

  /// Storage I/O failure, surfaced untouched. Retry policy is the caller's.
  #[error("store error: {0}")]
  Store(#[from] E),
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The daily-quote selection engine.
///
/// Cheap to share behind an [`Arc`]; all methods take `&self`.
pub struct SelectionEngine<S, C = LocalClock> {
  store: Arc<S>,
  clock: C,
  /// Serializes the whole check/draw/commit sequence so two overlapping
  /// callers can never interleave cache reads with commits.
  guard: Mutex<()>,
}

impl<S: QuoteStore> SelectionEngine<S> {
  pub fn new(store: Arc<S>) -> Self { Self::with_clock(store, LocalClock) }
}

impl<S: QuoteStore, C: Clock> SelectionEngine<S, C> {
  pub fn with_clock(store: Arc<S>, clock: C) -> Self {
    Self { store, clock, guard: Mutex::new(()) }
  }

  /// Today's quote for `filter`: the cached one when the cache slot is
  /// still valid, otherwise a fresh draw committed to history and cache.
  pub async fn today_quote(
    &self,
    filter: CategoryFilter,
  ) -> Result<Quote, EngineError<S::Error>> {
    let _guard = self.guard.lock().await;
    let today = self.clock.today();

    if let Some(cached) = self.cached_today(filter, today).await? {
      tracing::debug!(quote_id = %cached.id, "day cache hit");
      return Ok(cached);
    }

    self.draw_and_commit(filter, today).await
  }

  /// Force a fresh draw, discarding any quote already cached for today.
  /// Used when the user switches category.
  pub async fn refresh(
    &self,
    filter: CategoryFilter,
  ) -> Result<Quote, EngineError<S::Error>> {
    let _guard = self.guard.lock().await;
    let today = self.clock.today();

    self
      .store
      .delete_settings(&[keys::TODAY_QUOTE_DATE, keys::TODAY_QUOTE_ID])
      .await?;

    self.draw_and_commit(filter, today).await
  }

  /// The cached quote, provided the slot is dated `today`, the id resolves,
  /// and the quote satisfies `filter`. A slot pointing at a quote that no
  /// longer resolves is a consistency fault; it self-heals as a plain miss.
  async fn cached_today(
    &self,
    filter: CategoryFilter,
    today: NaiveDate,
  ) -> Result<Option<Quote>, EngineError<S::Error>> {
    let Some(date_str) = self.store.setting(keys::TODAY_QUOTE_DATE).await?
    else {
      return Ok(None);
    };
    match date_str.parse::<NaiveDate>() {
      Ok(date) if date == today => {}
      // Stale or unparseable slot; redraw.
      _ => return Ok(None),
    }

    let Some(id) = self.store.setting(keys::TODAY_QUOTE_ID).await? else {
      return Ok(None);
    };
    let Some(quote) = self.store.quote_by_id(&id).await? else {
      tracing::debug!(quote_id = %id, "cache slot references unknown quote, redrawing");
      return Ok(None);
    };

    if !filter.matches(quote.category) {
      return Ok(None);
    }
    Ok(Some(quote))
  }

  async fn draw_and_commit(
    &self,
    filter: CategoryFilter,
    today: NaiveDate,
  ) -> Result<Quote, EngineError<S::Error>> {
    let since = today
      .checked_sub_days(Days::new(EXCLUSION_WINDOW_DAYS))
      .unwrap_or(NaiveDate::MIN);
    let excluded = self.store.recently_shown(since).await?;
    let mut eligible = self.store.eligible_quotes(filter, &excluded).await?;

    if eligible.is_empty() {
      return Err(EngineError::Exhausted(filter));
    }

    // Uniform over the eligible set; no seeding or reproducibility needed.
    let idx = rand::rng().random_range(0..eligible.len());
    let quote = eligible.swap_remove(idx);

    self.store.commit_selection(&quote.id, today).await?;
    tracing::info!(quote_id = %quote.id, category = %quote.category, %today, "selected quote of the day");

    // Best-effort housekeeping; the selection above is already durable.
    let cutoff = today
      .checked_sub_days(Days::new(RETENTION_DAYS))
      .unwrap_or(NaiveDate::MIN);
    if let Err(e) = self.store.prune_shown_on_or_before(cutoff).await {
      tracing::warn!(error = %e, "history prune failed");
    }

    Ok(quote)
  }
}
