//! [`SqliteStore`] — the SQLite implementation of [`QuoteStore`].

use std::{collections::HashSet, path::Path};

use chrono::NaiveDate;
use quotidian_core::{
  quote::{CategoryFilter, Quote},
  store::{QuoteStore, keys},
};
use rusqlite::OptionalExtension as _;

use crate::{
  Error, Result,
  encode::{RawQuote, encode_category, encode_date},
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quotidian store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

#[cfg(test)]
impl SqliteStore {
  /// Total number of history rows, including duplicates per quote.
  pub(crate) async fn history_row_count(&self) -> Result<usize> {
    let count = self
      .conn
      .call(|conn| {
        Ok(conn.query_row("SELECT COUNT(*) FROM quote_history", [], |row| {
          row.get::<_, i64>(0)
        })?)
      })
      .await?;
    Ok(count as usize)
  }
}

// ─── QuoteStore impl ─────────────────────────────────────────────────────────

impl QuoteStore for SqliteStore {
  type Error = Error;

  // ── Corpus ────────────────────────────────────────────────────────────────

  async fn quote_by_id(&self, id: &str) -> Result<Option<Quote>> {
    let id = id.to_owned();

    let raw: Option<RawQuote> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT id, text, author, category FROM quotes WHERE id = ?1",
              rusqlite::params![id],
              |row| {
                Ok(RawQuote {
                  id:       row.get(0)?,
                  text:     row.get(1)?,
                  author:   row.get(2)?,
                  category: row.get(3)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawQuote::into_quote).transpose()
  }

  async fn eligible_quotes(
    &self,
    filter: CategoryFilter,
    excluded: &HashSet<String>,
  ) -> Result<Vec<Quote>> {
    let category = match filter {
      CategoryFilter::All => None,
      CategoryFilter::Only(c) => Some(encode_category(c).to_owned()),
    };
    let excluded: Vec<String> = excluded.iter().cloned().collect();

    let raws: Vec<RawQuote> = self
      .conn
      .call(move |conn| {
        // Build the WHERE clause dynamically. The category filter is part
        // of the query itself, never applied after sampling.
        let mut conds: Vec<String> = vec![];
        let mut params: Vec<&dyn rusqlite::ToSql> = vec![];

        if let Some(c) = &category {
          conds.push("category = ?".into());
          params.push(c);
        }
        if !excluded.is_empty() {
          let placeholders = vec!["?"; excluded.len()].join(", ");
          conds.push(format!("id NOT IN ({placeholders})"));
          for id in &excluded {
            params.push(id);
          }
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        let sql = format!(
          "SELECT id, text, author, category FROM quotes {where_clause}"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params.as_slice(), |row| {
            Ok(RawQuote {
              id:       row.get(0)?,
              text:     row.get(1)?,
              author:   row.get(2)?,
              category: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuote::into_quote).collect()
  }

  async fn seed_quotes(&self, quotes: Vec<Quote>) -> Result<usize> {
    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut inserted = 0usize;
        {
          let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO quotes (id, text, author, category)
             VALUES (?1, ?2, ?3, ?4)",
          )?;
          for q in &quotes {
            inserted += stmt.execute(rusqlite::params![
              q.id,
              q.text,
              q.author,
              encode_category(q.category),
            ])?;
          }
        }
        tx.commit()?;
        Ok(inserted)
      })
      .await?;

    Ok(inserted)
  }

  // ── History ledger ────────────────────────────────────────────────────────

  async fn recently_shown(&self, since: NaiveDate) -> Result<HashSet<String>> {
    let since_str = encode_date(since);

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT quote_id FROM quote_history WHERE shown_date >= ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since_str], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(ids)
  }

  async fn record_shown(&self, quote_id: &str, date: NaiveDate) -> Result<()> {
    let quote_id = quote_id.to_owned();
    let date_str = encode_date(date);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quote_history (quote_id, shown_date) VALUES (?1, ?2)",
          rusqlite::params![quote_id, date_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn prune_shown_on_or_before(&self, cutoff: NaiveDate) -> Result<usize> {
    let cutoff_str = encode_date(cutoff);

    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM quote_history WHERE shown_date <= ?1",
          rusqlite::params![cutoff_str],
        )?)
      })
      .await?;

    Ok(deleted)
  }

  async fn commit_selection(&self, quote_id: &str, date: NaiveDate) -> Result<()> {
    let quote_id = quote_id.to_owned();
    let date_str = encode_date(date);

    // One transaction: the history row and the cache slot land together or
    // not at all, so a crash cannot leave the quote excluded but uncached.
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO quote_history (quote_id, shown_date) VALUES (?1, ?2)",
          rusqlite::params![quote_id, date_str],
        )?;
        tx.execute(
          "INSERT OR REPLACE INTO user_settings (key, value) VALUES (?1, ?2)",
          rusqlite::params![keys::TODAY_QUOTE_DATE, date_str],
        )?;
        tx.execute(
          "INSERT OR REPLACE INTO user_settings (key, value) VALUES (?1, ?2)",
          rusqlite::params![keys::TODAY_QUOTE_ID, quote_id],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Settings ──────────────────────────────────────────────────────────────

  async fn setting(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();

    let value = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT value FROM user_settings WHERE key = ?1",
              rusqlite::params![key],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(value)
  }

  async fn put_setting(&self, key: &str, value: &str) -> Result<()> {
    let key = key.to_owned();
    let value = value.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO user_settings (key, value) VALUES (?1, ?2)",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_settings(&self, keys: &[&str]) -> Result<()> {
    if keys.is_empty() {
      return Ok(());
    }
    let keys: Vec<String> = keys.iter().map(|k| (*k).to_owned()).collect();

    self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql =
          format!("DELETE FROM user_settings WHERE key IN ({placeholders})");
        let params: Vec<&dyn rusqlite::ToSql> =
          keys.iter().map(|k| k as &dyn rusqlite::ToSql).collect();
        conn.execute(&sql, params.as_slice())?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}
