//! City directory: name to OSM relation id
//!
//! Injected from a JSON file rather than compiled in, so adding a city never
//! needs a code change. Lookup is case-insensitive, numeric relation ids
//! pass straight through, and misspelled names get a fuzzy suggestion.

use std::collections::HashMap;
use std::path::Path;

use strsim::{jaro_winkler, normalized_levenshtein};

use crate::core::error::{Error, Result};

/// Minimum blended similarity before a suggestion is offered. Tuned to catch
/// ordinary typos without matching unrelated names.
const SUGGESTION_THRESHOLD: f64 = 0.65;

/// Known cities and their OSM relation ids
#[derive(Debug, Clone, Default)]
pub struct CityDirectory {
    cities: HashMap<String, u64>,
}

impl CityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a directory from a JSON object of `{ "name": relation_id }`
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let cities: HashMap<String, u64> = serde_json::from_str(&raw)?;
        Ok(Self { cities })
    }

    pub fn from_map(cities: HashMap<String, u64>) -> Self {
        Self { cities }
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// City names in deterministic order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.cities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve user input to a relation id. Numeric input is taken as a
    /// relation id directly; anything else is a case-insensitive name
    /// lookup, with a fuzzy suggestion on miss.
    pub fn resolve(&self, input: &str) -> Result<u64> {
        if let Ok(id) = input.parse::<u64>() {
            return Ok(id);
        }

        for name in self.names() {
            if name.eq_ignore_ascii_case(input) {
                return Ok(self.cities[name]);
            }
        }

        match self.suggest(input) {
            Some(suggestion) => Err(Error::InvalidInput(format!(
                "Unknown city '{input}'. Did you mean '{suggestion}'?"
            ))),
            None => Err(Error::InvalidInput(format!(
                "Unknown city '{input}' (not in the city directory and not a numeric relation id)"
            ))),
        }
    }

    /// Best fuzzy match for a misspelled name. Jaro-Winkler favors the
    /// prefix typos common in place names; normalized Levenshtein covers
    /// insertions and deletions.
    fn suggest(&self, input: &str) -> Option<&str> {
        let input_lower = input.to_lowercase();
        let mut best_match = None;
        let mut best_score = 0.0f64;

        for name in self.names() {
            let name_lower = name.to_lowercase();
            let score = jaro_winkler(&input_lower, &name_lower) * 0.7
                + normalized_levenshtein(&input_lower, &name_lower) * 0.3;

            if score >= SUGGESTION_THRESHOLD && score > best_score {
                best_score = score;
                best_match = Some(name);
            }
        }

        best_match
    }
}
