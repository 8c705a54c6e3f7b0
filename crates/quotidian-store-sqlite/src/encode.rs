//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Calendar dates are stored as `YYYY-MM-DD` strings, which sort and compare
//! correctly as text. Categories are stored as their snake_case names.

use chrono::NaiveDate;
use quotidian_core::quote::{Category, Quote};

use crate::Result;

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String {
  d.format("%Y-%m-%d").to_string()
}

// ─── Category ────────────────────────────────────────────────────────────────

pub fn encode_category(c: Category) -> &'static str { c.as_str() }

pub fn decode_category(s: &str) -> Result<Category> {
  Ok(s.parse::<Category>()?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `quotes` row.
pub struct RawQuote {
  pub id:       String,
  pub text:     String,
  pub author:   Option<String>,
  pub category: String,
}

impl RawQuote {
  pub fn into_quote(self) -> Result<Quote> {
    Ok(Quote {
      id:       self.id,
      text:     self.text,
      author:   self.author,
      category: decode_category(&self.category)?,
    })
  }
}
