//! Candidate word validation for the anagram level
//!
//! A candidate is accepted when it is on the level's whitelist, can be
//! spelled from the source word's letters (each source letter used at
//! most once), and has not been found already.

use std::collections::HashMap;

use thiserror::Error;

/// Why a candidate was turned down
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("'{0}' is not in the word list")]
    NotInWordList(String),
    #[error("'{0}' needs letters the base word does not have")]
    LettersUnavailable(String),
    #[error("'{0}' was already found")]
    AlreadyFound(String),
}

fn letter_counts(word: &str) -> HashMap<char, usize> {
    let mut counts = HashMap::new();
    for c in word.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    counts
}

/// Multiset-subset check: every letter of `candidate` can be drawn from
/// `source` without exceeding its count there. Case-insensitive.
pub fn is_feasible(candidate: &str, source: &str) -> bool {
    let available = letter_counts(&source.to_lowercase());
    letter_counts(&candidate.to_lowercase())
        .into_iter()
        .all(|(c, needed)| available.get(&c).copied().unwrap_or(0) >= needed)
}

/// Validator bound to one base word and its whitelist
#[derive(Debug, Clone)]
pub struct WordValidator {
    source: String,
    whitelist: Vec<String>,
}

impl WordValidator {
    pub fn new(source: &str, whitelist: &[String]) -> Self {
        Self {
            source: source.to_lowercase(),
            whitelist: whitelist.iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn whitelist(&self) -> &[String] {
        &self.whitelist
    }

    /// Whitelist membership (case-folded)
    pub fn is_member(&self, candidate: &str) -> bool {
        let candidate = candidate.to_lowercase();
        self.whitelist.iter().any(|w| *w == candidate)
    }

    pub fn is_feasible(&self, candidate: &str) -> bool {
        is_feasible(candidate, &self.source)
    }

    /// Run every check; returns the case-folded word on success
    pub fn validate(&self, candidate: &str, found: &[String]) -> Result<String, Rejection> {
        let word = candidate.to_lowercase();
        if !self.is_member(&word) {
            return Err(Rejection::NotInWordList(word));
        }
        if !self.is_feasible(&word) {
            return Err(Rejection::LettersUnavailable(word));
        }
        if found.iter().any(|f| *f == word) {
            return Err(Rejection::AlreadyFound(word));
        }
        Ok(word)
    }
}
