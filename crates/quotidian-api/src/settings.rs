//! Handlers for `/settings` endpoints.
//!
//! The settings surface is independent of the selection engine: the
//! notification scheduler reads only the enabled flag, and the category is
//! the default filter for `/quote/today`.

use axum::{Json, extract::State};
use quotidian_core::{
  quote::CategoryFilter,
  store::{QuoteStore, keys},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct SettingsBody {
  pub category:              String,
  pub notifications_enabled: bool,
}

async fn read_settings<S: QuoteStore>(store: &S) -> Result<SettingsBody, ApiError> {
  let category = store
    .setting(keys::CATEGORY)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .unwrap_or_else(|| "all".to_owned());
  let notifications_enabled = store
    .setting(keys::NOTIFICATIONS_ENABLED)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .is_some_and(|v| v == "true");

  Ok(SettingsBody { category, notifications_enabled })
}

/// `GET /settings`
pub async fn get_all<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<SettingsBody>, ApiError>
where
  S: QuoteStore,
{
  Ok(Json(read_settings(state.store.as_ref()).await?))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateBody {
  pub category:              Option<String>,
  pub notifications_enabled: Option<bool>,
}

/// `PUT /settings` — body with optional `category` and
/// `notifications_enabled` fields; omitted fields are left unchanged.
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<UpdateBody>,
) -> Result<Json<SettingsBody>, ApiError>
where
  S: QuoteStore,
{
  let store = state.store.as_ref();

  if let Some(raw) = body.category {
    // Validate before writing; the store itself accepts any string.
    raw
      .parse::<CategoryFilter>()
      .map_err(|_| ApiError::BadRequest(format!("unknown category: {raw:?}")))?;
    store
      .put_setting(keys::CATEGORY, &raw)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
  }

  if let Some(enabled) = body.notifications_enabled {
    store
      .put_setting(keys::NOTIFICATIONS_ENABLED, if enabled { "true" } else { "false" })
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
  }

  Ok(Json(read_settings(store).await?))
}
