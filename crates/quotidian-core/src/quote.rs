//! Quote — one entry in the fixed, read-only corpus.
//!
//! Quotes are bulk-seeded once and never modified or deleted by the running
//! system. Every quote carries exactly one [`Category`]; the "all" filter is
//! a query-time pseudo-value ([`CategoryFilter::All`]) and is never stored.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The fixed set of corpus categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  Motivational,
  Demotivational,
  Funny,
  FunFacts,
}

impl Category {
  pub fn as_str(self) -> &'static str {
    match self {
      Category::Motivational => "motivational",
      Category::Demotivational => "demotivational",
      Category::Funny => "funny",
      Category::FunFacts => "fun_facts",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "motivational" => Ok(Category::Motivational),
      "demotivational" => Ok(Category::Demotivational),
      "funny" => Ok(Category::Funny),
      "fun_facts" => Ok(Category::FunFacts),
      other => Err(Error::UnknownCategory(other.to_owned())),
    }
  }
}

/// Category filter for corpus queries.
///
/// `All` never narrows by category, only by exclusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryFilter {
  All,
  Only(Category),
}

impl CategoryFilter {
  /// Whether a quote of `category` satisfies this filter.
  pub fn matches(self, category: Category) -> bool {
    match self {
      CategoryFilter::All => true,
      CategoryFilter::Only(c) => c == category,
    }
  }
}

impl fmt::Display for CategoryFilter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CategoryFilter::All => f.write_str("all"),
      CategoryFilter::Only(c) => f.write_str(c.as_str()),
    }
  }
}

impl FromStr for CategoryFilter {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    if s == "all" {
      Ok(CategoryFilter::All)
    } else {
      s.parse().map(CategoryFilter::Only)
    }
  }
}

/// One corpus entry. Immutable once seeded.
///
/// `author` is genuinely optional — an anonymous quote propagates with
/// `None`, never a placeholder string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
  pub id:       String,
  pub text:     String,
  pub author:   Option<String>,
  pub category: Category,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn category_str_roundtrip() {
    for c in [
      Category::Motivational,
      Category::Demotivational,
      Category::Funny,
      Category::FunFacts,
    ] {
      assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
    }
  }

  #[test]
  fn unknown_category_rejected() {
    assert!(matches!(
      "inspirational".parse::<Category>(),
      Err(Error::UnknownCategory(_))
    ));
    // "all" is a filter value, not a storable category.
    assert!("all".parse::<Category>().is_err());
  }

  #[test]
  fn filter_parse_and_match() {
    let all: CategoryFilter = "all".parse().unwrap();
    assert!(all.matches(Category::Funny));

    let only: CategoryFilter = "funny".parse().unwrap();
    assert_eq!(only, CategoryFilter::Only(Category::Funny));
    assert!(only.matches(Category::Funny));
    assert!(!only.matches(Category::Motivational));
  }
}
