//! Calendar-day source for the selection engine.
//!
//! Selection is keyed on the local calendar *date*, not an instant. The
//! trait exists so tests can simulate day changes and process restarts.

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
  /// The current local calendar date.
  fn today(&self) -> NaiveDate;
}

/// Production clock: the host's local date.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
  fn today(&self) -> NaiveDate { Local::now().date_naive() }
}
