//! Integration tests for `SqliteStore` and the selection engine, run against
//! an in-memory database.

use std::{
  collections::HashSet,
  sync::{Arc, Mutex},
};

use chrono::{Days, NaiveDate};
use quotidian_core::{
  clock::Clock,
  engine::{EngineError, SelectionEngine},
  quote::{Category, CategoryFilter, Quote},
  store::{QuoteStore, keys},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn quote(id: &str, category: Category) -> Quote {
  Quote {
    id:       id.into(),
    text:     format!("text of {id}"),
    author:   Some("Someone".into()),
    category,
  }
}

fn day(s: &str) -> NaiveDate { s.parse().expect("date literal") }

/// Test clock whose date can be advanced mid-test.
#[derive(Clone)]
struct ManualClock(Arc<Mutex<NaiveDate>>);

impl ManualClock {
  fn new(d: NaiveDate) -> Self { Self(Arc::new(Mutex::new(d))) }
  fn set(&self, d: NaiveDate) { *self.0.lock().unwrap() = d; }
}

impl Clock for ManualClock {
  fn today(&self) -> NaiveDate { *self.0.lock().unwrap() }
}

fn engine(
  store: &SqliteStore,
  clock: &ManualClock,
) -> SelectionEngine<SqliteStore, ManualClock> {
  SelectionEngine::with_clock(Arc::new(store.clone()), clock.clone())
}

// ─── Corpus ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn seed_quotes_is_idempotent() {
  let s = store().await;
  let corpus = vec![
    quote("q1", Category::Motivational),
    quote("q2", Category::Funny),
  ];

  assert_eq!(s.seed_quotes(corpus.clone()).await.unwrap(), 2);
  // Re-seeding inserts nothing and overwrites nothing.
  assert_eq!(s.seed_quotes(corpus).await.unwrap(), 0);

  let q1 = s.quote_by_id("q1").await.unwrap().unwrap();
  assert_eq!(q1.category, Category::Motivational);
}

#[tokio::test]
async fn quote_by_id_missing_returns_none() {
  let s = store().await;
  assert!(s.quote_by_id("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn anonymous_author_roundtrips_as_none() {
  let s = store().await;
  let mut q = quote("anon", Category::FunFacts);
  q.author = None;
  s.seed_quotes(vec![q]).await.unwrap();

  let fetched = s.quote_by_id("anon").await.unwrap().unwrap();
  assert_eq!(fetched.author, None);
}

#[tokio::test]
async fn eligible_quotes_filters_category_and_exclusions() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("m1", Category::Motivational),
    quote("m2", Category::Motivational),
    quote("f1", Category::Funny),
  ])
  .await
  .unwrap();

  let excluded: HashSet<String> = ["m1".to_owned()].into_iter().collect();

  let eligible = s
    .eligible_quotes(CategoryFilter::Only(Category::Motivational), &excluded)
    .await
    .unwrap();
  assert_eq!(eligible.len(), 1);
  assert_eq!(eligible[0].id, "m2");
}

#[tokio::test]
async fn all_filter_never_narrows_by_category() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("m1", Category::Motivational),
    quote("f1", Category::Funny),
    quote("d1", Category::Demotivational),
  ])
  .await
  .unwrap();

  let excluded: HashSet<String> = ["f1".to_owned()].into_iter().collect();

  let eligible = s
    .eligible_quotes(CategoryFilter::All, &excluded)
    .await
    .unwrap();
  let ids: HashSet<_> = eligible.into_iter().map(|q| q.id).collect();
  assert_eq!(ids, ["m1".to_owned(), "d1".to_owned()].into_iter().collect());
}

// ─── History ledger ──────────────────────────────────────────────────────────

#[tokio::test]
async fn recently_shown_is_inclusive_of_window_start() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
  ])
  .await
  .unwrap();

  let since = day("2025-01-01");
  s.record_shown("a", since).await.unwrap();
  s.record_shown("b", since - Days::new(1)).await.unwrap();

  let shown = s.recently_shown(since).await.unwrap();
  assert!(shown.contains("a"));
  assert!(!shown.contains("b"));
}

#[tokio::test]
async fn prune_removes_cutoff_row_and_keeps_newer() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("old", Category::Funny),
    quote("new", Category::Funny),
  ])
  .await
  .unwrap();

  let cutoff = day("2024-07-01");
  s.record_shown("old", cutoff).await.unwrap();
  s.record_shown("new", cutoff + Days::new(1)).await.unwrap();

  // The row dated exactly at the cutoff goes; the one a day newer stays.
  assert_eq!(s.prune_shown_on_or_before(cutoff).await.unwrap(), 1);

  let remaining = s.recently_shown(NaiveDate::MIN).await.unwrap();
  assert!(!remaining.contains("old"));
  assert!(remaining.contains("new"));
}

#[tokio::test]
async fn commit_selection_writes_history_and_cache_together() {
  let s = store().await;
  s.seed_quotes(vec![quote("q1", Category::Funny)]).await.unwrap();

  let today = day("2025-03-10");
  s.commit_selection("q1", today).await.unwrap();

  assert_eq!(
    s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().as_deref(),
    Some("2025-03-10")
  );
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_ID).await.unwrap().as_deref(),
    Some("q1")
  );
  assert!(s.recently_shown(today).await.unwrap().contains("q1"));
}

// ─── Settings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn settings_overwrite_and_delete() {
  let s = store().await;

  assert!(s.setting(keys::CATEGORY).await.unwrap().is_none());

  s.put_setting(keys::CATEGORY, "funny").await.unwrap();
  s.put_setting(keys::CATEGORY, "all").await.unwrap();
  assert_eq!(
    s.setting(keys::CATEGORY).await.unwrap().as_deref(),
    Some("all")
  );

  s.delete_settings(&[keys::CATEGORY, keys::NOTIFICATIONS_ENABLED])
    .await
    .unwrap();
  assert!(s.setting(keys::CATEGORY).await.unwrap().is_none());
}

// ─── Engine: same-day idempotence ────────────────────────────────────────────

#[tokio::test]
async fn same_day_requests_return_same_quote_and_one_history_row() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
    quote("c", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let first = e.today_quote(CategoryFilter::All).await.unwrap();
  let second = e.today_quote(CategoryFilter::All).await.unwrap();
  assert_eq!(first.id, second.id);

  assert_eq!(s.history_row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn committed_choice_survives_engine_restart() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let chosen = engine(&s, &clock)
    .today_quote(CategoryFilter::All)
    .await
    .unwrap();

  // Fresh engine over the same store, same date: cache hit, no new row.
  let again = engine(&s, &clock)
    .today_quote(CategoryFilter::All)
    .await
    .unwrap();
  assert_eq!(again.id, chosen.id);
  assert_eq!(s.history_row_count().await.unwrap(), 1);
}

// ─── Engine: refresh / category switch ───────────────────────────────────────

#[tokio::test]
async fn refresh_with_new_category_redraws_matching_quote() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("m1", Category::Motivational),
    quote("f1", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let cached = e
    .today_quote(CategoryFilter::Only(Category::Motivational))
    .await
    .unwrap();
  assert_eq!(cached.id, "m1");

  let switched = e
    .refresh(CategoryFilter::Only(Category::Funny))
    .await
    .unwrap();
  assert_eq!(switched.category, Category::Funny);

  // The cache slot now points at the new quote, dated today.
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_ID).await.unwrap().as_deref(),
    Some("f1")
  );
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().as_deref(),
    Some("2025-05-01")
  );
}

#[tokio::test]
async fn refresh_same_day_draws_a_quote_not_yet_shown() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let first = e.today_quote(CategoryFilter::All).await.unwrap();
  // The first draw is already in history, so the forced redraw must land
  // on the other quote.
  let second = e.refresh(CategoryFilter::All).await.unwrap();
  assert_ne!(first.id, second.id);
}

// ─── Engine: no-repeat window and exhaustion ─────────────────────────────────

#[tokio::test]
async fn no_repeats_across_days_until_corpus_exhausted() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
    quote("c", Category::Funny),
  ])
  .await
  .unwrap();

  let start = day("2025-05-01");
  let clock = ManualClock::new(start);
  let e = engine(&s, &clock);

  let mut seen = HashSet::new();
  for offset in 0..3u64 {
    clock.set(start + Days::new(offset));
    let q = e.today_quote(CategoryFilter::All).await.unwrap();
    assert!(seen.insert(q.id), "quote repeated within the window");
  }

  clock.set(start + Days::new(3));
  let err = e.today_quote(CategoryFilter::All).await.unwrap_err();
  assert!(matches!(err, EngineError::Exhausted(_)));
}

#[tokio::test]
async fn exhaustion_in_narrow_category() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("q1", Category::Motivational),
    quote("q2", Category::Funny),
  ])
  .await
  .unwrap();

  let day1 = day("2025-05-01");
  let clock = ManualClock::new(day1);
  let e = engine(&s, &clock);
  let motivational = CategoryFilter::Only(Category::Motivational);

  // Day 1: q1 is the only motivational quote; cached on second request.
  let first = e.today_quote(motivational).await.unwrap();
  assert_eq!(first.id, "q1");
  let second = e.today_quote(motivational).await.unwrap();
  assert_eq!(second.id, "q1");

  // Day 2, still inside the window: q1 is excluded and nothing else
  // qualifies. The stale cache slot is left untouched.
  clock.set(day1 + Days::new(1));
  let err = e.today_quote(motivational).await.unwrap_err();
  assert!(matches!(err, EngineError::Exhausted(_)));
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_ID).await.unwrap().as_deref(),
    Some("q1")
  );
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().as_deref(),
    Some("2025-05-01")
  );

  // Exactly one history row was ever written.
  assert_eq!(s.history_row_count().await.unwrap(), 1);
}

#[tokio::test]
async fn exhausted_empty_corpus_performs_no_writes() {
  let s = store().await;

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let err = e.today_quote(CategoryFilter::All).await.unwrap_err();
  assert!(matches!(err, EngineError::Exhausted(CategoryFilter::All)));

  assert!(s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().is_none());
  assert!(s.setting(keys::TODAY_QUOTE_ID).await.unwrap().is_none());
  assert_eq!(s.history_row_count().await.unwrap(), 0);
}

#[tokio::test]
async fn quote_becomes_eligible_again_outside_window() {
  let s = store().await;
  s.seed_quotes(vec![quote("only", Category::Funny)]).await.unwrap();

  let day1 = day("2024-01-01");
  let clock = ManualClock::new(day1);
  let e = engine(&s, &clock);

  assert_eq!(e.today_quote(CategoryFilter::All).await.unwrap().id, "only");

  // One day past the 365-day window: the old showing no longer excludes.
  clock.set(day1 + Days::new(366));
  assert_eq!(e.today_quote(CategoryFilter::All).await.unwrap().id, "only");
}

// ─── Engine: cache-slot faults ───────────────────────────────────────────────

#[tokio::test]
async fn dangling_cache_slot_self_heals() {
  let s = store().await;
  s.seed_quotes(vec![quote("real", Category::Funny)]).await.unwrap();

  // A cache slot dated today but pointing at a quote that does not exist.
  s.put_setting(keys::TODAY_QUOTE_DATE, "2025-05-01").await.unwrap();
  s.put_setting(keys::TODAY_QUOTE_ID, "vanished").await.unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let q = e.today_quote(CategoryFilter::All).await.unwrap();
  assert_eq!(q.id, "real");
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_ID).await.unwrap().as_deref(),
    Some("real")
  );
}

#[tokio::test]
async fn category_mismatched_cache_slot_triggers_redraw() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("m1", Category::Motivational),
    quote("f1", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let cached = e
    .today_quote(CategoryFilter::Only(Category::Motivational))
    .await
    .unwrap();
  assert_eq!(cached.id, "m1");

  // Same day, different category: the today-dated slot no longer satisfies
  // the filter, so this is a miss — fresh draw, second history row, and a
  // rewritten cache slot.
  let redrawn = e
    .today_quote(CategoryFilter::Only(Category::Funny))
    .await
    .unwrap();
  assert_eq!(redrawn.category, Category::Funny);

  assert_eq!(
    s.setting(keys::TODAY_QUOTE_ID).await.unwrap().as_deref(),
    Some("f1")
  );
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().as_deref(),
    Some("2025-05-01")
  );
  assert_eq!(s.history_row_count().await.unwrap(), 2);
}

#[tokio::test]
async fn stale_cache_date_triggers_redraw() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
  ])
  .await
  .unwrap();

  let day1 = day("2025-05-01");
  let clock = ManualClock::new(day1);
  let e = engine(&s, &clock);

  let yesterday_quote = e.today_quote(CategoryFilter::All).await.unwrap();

  clock.set(day1 + Days::new(1));
  let today_quote = e.today_quote(CategoryFilter::All).await.unwrap();
  assert_ne!(today_quote.id, yesterday_quote.id);
  assert_eq!(
    s.setting(keys::TODAY_QUOTE_DATE).await.unwrap().as_deref(),
    Some("2025-05-02")
  );
}

// ─── Engine: concurrency ─────────────────────────────────────────────────────

#[tokio::test]
async fn overlapping_callers_observe_one_selection() {
  let s = store().await;
  s.seed_quotes(vec![
    quote("a", Category::Funny),
    quote("b", Category::Funny),
    quote("c", Category::Funny),
  ])
  .await
  .unwrap();

  let clock = ManualClock::new(day("2025-05-01"));
  let e = engine(&s, &clock);

  let (first, second) = tokio::join!(
    e.today_quote(CategoryFilter::All),
    e.today_quote(CategoryFilter::All),
  );
  assert_eq!(first.unwrap().id, second.unwrap().id);
  assert_eq!(s.history_row_count().await.unwrap(), 1);
}
