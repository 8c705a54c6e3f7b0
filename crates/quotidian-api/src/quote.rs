//! Handlers for `/quote` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/quote/today` | Optional `?category=all\|motivational\|...` |
//! | `POST` | `/quote/refresh` | Body: `{"category":"funny"}`, all fields optional |
//!
//! When no category is given, the user's stored selection applies, falling
//! back to `all`.

use axum::{
  Json,
  extract::{Query, State},
};
use quotidian_core::{
  engine::EngineError,
  quote::{CategoryFilter, Quote},
  store::{QuoteStore, keys},
};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

fn engine_err<E>(e: EngineError<E>) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  match e {
    EngineError::Exhausted(filter) => ApiError::Exhausted(format!(
      "no quote available for category {filter}; try switching categories"
    )),
    EngineError::Store(e) => ApiError::Store(Box::new(e)),
  }
}

/// Resolve the effective filter: an explicit request value wins, otherwise
/// the stored category setting, otherwise `all`. Only explicit values are
/// validated — an unreadable stored value degrades to `all`.
async fn resolve_filter<S: QuoteStore>(
  store: &S,
  explicit: Option<String>,
) -> Result<CategoryFilter, ApiError> {
  if let Some(raw) = explicit {
    return raw
      .parse()
      .map_err(|_| ApiError::BadRequest(format!("unknown category: {raw:?}")));
  }

  let stored = store
    .setting(keys::CATEGORY)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(match stored {
    Some(raw) => raw.parse().unwrap_or_else(|_| {
      tracing::debug!(value = %raw, "stored category unreadable, defaulting to all");
      CategoryFilter::All
    }),
    None => CategoryFilter::All,
  })
}

// ─── Today ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct TodayParams {
  pub category: Option<String>,
}

/// `GET /quote/today[?category=<filter>]`
pub async fn today<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<TodayParams>,
) -> Result<Json<Quote>, ApiError>
where
  S: QuoteStore,
{
  let filter = resolve_filter(state.store.as_ref(), params.category).await?;
  let quote = state.engine.today_quote(filter).await.map_err(engine_err)?;
  Ok(Json(quote))
}

// ─── Refresh ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Default)]
pub struct RefreshBody {
  pub category: Option<String>,
}

/// `POST /quote/refresh` — discard today's cached quote and redraw.
pub async fn refresh<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RefreshBody>,
) -> Result<Json<Quote>, ApiError>
where
  S: QuoteStore,
{
  let filter = resolve_filter(state.store.as_ref(), body.category).await?;
  let quote = state.engine.refresh(filter).await.map_err(engine_err)?;
  Ok(Json(quote))
}
