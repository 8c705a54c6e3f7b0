//! JSON REST API for Quotidian.
//!
//! Exposes an axum [`Router`] backed by any [`quotidian_core::store::QuoteStore`].
//! Rendering of the quote into a shareable image and notification scheduling
//! are external collaborators; the API only returns quotes and persists the
//! settings those collaborators read.

pub mod error;
pub mod quote;
pub mod settings;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use quotidian_core::{engine::SelectionEngine, store::QuoteStore};
use serde::Deserialize;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: QuoteStore> {
  pub engine: Arc<SelectionEngine<S>>,
  pub store:  Arc<S>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: QuoteStore + Clone + Send + Sync + 'static,
{
  Router::new()
    .route("/quote/today", get(quote::today::<S>))
    .route("/quote/refresh", post(quote::refresh::<S>))
    .route(
      "/settings",
      get(settings::get_all::<S>).put(settings::update::<S>),
    )
    .with_state(state)
}
