// petalcart/src/search.rs

//! Building blocks for the catalog's substring search.
//!
//! Matching itself happens in SQL (`ILIKE`); this module turns user input into
//! the patterns bound to those queries. There is no ranking: callers get rows
//! in storage order.

use crate::errors::{AppError, Result};

/// Longest search term accepted from a request.
pub const MAX_TERM_LEN: usize = 100;

/// Fixed mapping from normalized user phrasing to catalog subcategory labels.
///
/// Keys are normalized with [`normalize_key`].
const SUBCATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
  ("valentine", &["Valentine's Day"]),
  ("valentines", &["Valentine's Day"]),
  ("valentines day", &["Valentine's Day"]),
  ("mother", &["Mother's Day"]),
  ("mothers day", &["Mother's Day"]),
  ("father", &["Father's Day"]),
  ("fathers day", &["Father's Day"]),
  ("bday", &["Birthday"]),
  ("birthday", &["Birthday"]),
  ("anniversary", &["Anniversary"]),
  ("wedding", &["Wedding", "Bridal"]),
  ("bridal", &["Bridal", "Wedding"]),
  ("get well", &["Get Well Soon"]),
  ("get well soon", &["Get Well Soon"]),
  ("funeral", &["Sympathy"]),
  ("condolence", &["Sympathy"]),
  ("condolences", &["Sympathy"]),
  ("sympathy", &["Sympathy"]),
  ("lily", &["Lilies"]),
  ("rose", &["Roses"]),
  ("orchid", &["Orchids"]),
  ("tulip", &["Tulips"]),
  ("carnation", &["Carnations"]),
  ("gerbera", &["Gerberas"]),
  ("sunflower", &["Sunflowers"]),
];

/// Case-insensitive synonym lookup for subcategory searches.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynonymTable;

impl SynonymTable {
  /// Canonical labels the term stands for, if any.
  pub fn lookup(&self, term: &str) -> &'static [&'static str] {
    let key = normalize_key(term);
    SUBCATEGORY_SYNONYMS
      .iter()
      .find(|(k, _)| *k == key)
      .map(|(_, labels)| *labels)
      .unwrap_or(&[])
  }

  /// The term itself followed by its synonyms, without case-insensitive duplicates.
  pub fn expand(&self, term: &str) -> Vec<String> {
    let mut terms = vec![term.to_string()];
    for label in self.lookup(term) {
      if !terms.iter().any(|t| t.eq_ignore_ascii_case(label)) {
        terms.push((*label).to_string());
      }
    }
    terms
  }
}

/// Lowercases, drops apostrophes and collapses whitespace.
pub fn normalize_key(term: &str) -> String {
  term
    .to_lowercase()
    .replace(['\'', '\u{2019}'], "")
    .split_whitespace()
    .collect::<Vec<_>>()
    .join(" ")
}

/// Trims and checks a user-supplied term.
pub fn clean_term(raw: &str) -> Result<String> {
  let term = raw.trim();
  if term.is_empty() {
    return Err(AppError::Validation("Search term must not be empty".to_string()));
  }
  if term.chars().count() > MAX_TERM_LEN {
    return Err(AppError::Validation(format!(
      "Search term must be at most {} characters",
      MAX_TERM_LEN
    )));
  }
  Ok(term.to_string())
}

/// Escapes `\`, `%` and `_` so they match literally under `ILIKE`.
pub fn escape_like(term: &str) -> String {
  let mut escaped = String::with_capacity(term.len());
  for c in term.chars() {
    if matches!(c, '\\' | '%' | '_') {
      escaped.push('\\');
    }
    escaped.push(c);
  }
  escaped
}

/// `%term%` with the term escaped.
pub fn contains_pattern(term: &str) -> String {
  format!("%{}%", escape_like(term))
}

/// Patterns for a subcategory search: the term plus every synonym.
pub fn subcategory_patterns(term: &str) -> Vec<String> {
  SynonymTable.expand(term).iter().map(|t| contains_pattern(t)).collect()
}

/// One pattern per whitespace-separated word; all of them must match.
pub fn all_terms_patterns(query: &str) -> Vec<String> {
  query.split_whitespace().map(contains_pattern).collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn synonyms_are_case_and_apostrophe_insensitive() {
    let table = SynonymTable;
    assert_eq!(table.lookup("valentine"), &["Valentine's Day"]);
    assert_eq!(table.lookup("  Valentine's   Day "), &["Valentine's Day"]);
    assert_eq!(table.lookup("MOTHERS DAY"), &["Mother's Day"]);
    assert!(table.lookup("hydrangea").is_empty());
  }

  #[test]
  fn expand_keeps_the_raw_term_first_and_skips_duplicates() {
    assert_eq!(SynonymTable.expand("valentine"), vec!["valentine", "Valentine's Day"]);
    assert_eq!(SynonymTable.expand("sympathy"), vec!["sympathy"]);
    assert_eq!(SynonymTable.expand("lilies"), vec!["lilies"]);
  }

  #[test]
  fn like_metacharacters_are_escaped() {
    assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    assert_eq!(contains_pattern("lilies"), "%lilies%");
  }

  #[test]
  fn subcategory_patterns_include_synonyms() {
    assert_eq!(subcategory_patterns("rose"), vec!["%rose%", "%Roses%"]);
    assert_eq!(subcategory_patterns("lilies"), vec!["%lilies%"]);
  }

  #[test]
  fn all_terms_patterns_split_on_whitespace() {
    assert_eq!(all_terms_patterns("  mixed   roses "), vec!["%mixed%", "%roses%"]);
    assert!(all_terms_patterns("   ").is_empty());
  }

  #[test]
  fn clean_term_rejects_blank_and_oversized_input() {
    assert_eq!(clean_term("  lilies ").unwrap(), "lilies");
    assert!(matches!(clean_term("   "), Err(AppError::Validation(_))));
    assert!(clean_term(&"a".repeat(MAX_TERM_LEN + 1)).is_err());
  }
}
