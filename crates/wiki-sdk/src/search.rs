//! Fuzzy page-name search joined with tag lookups.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use similar::TextDiff;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Minimum similarity ratio, in `[0, 1]`, for a name to match.
    pub cutoff: f32,
    /// Maximum number of fuzzy name matches.
    pub limit: usize,
    /// Also score each whitespace-separated word of a name on its own.
    pub match_words: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            cutoff: 0.6,
            limit: 3,
            match_words: true,
        }
    }
}

/// Scores page names against a query.
#[derive(Clone, Debug, Default)]
pub struct SearchEngine {
    options: SearchOptions,
}

/// `2 * matches / total` over characters.
fn ratio(a: &str, b: &str) -> f32 {
    TextDiff::from_chars(a, b).ratio()
}

impl SearchEngine {
    pub fn new(options: SearchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Case-insensitive similarity of `query` to `name`.
    pub fn similarity(&self, query: &str, name: &str) -> f32 {
        let query = query.to_lowercase();
        let name = name.to_lowercase();
        let whole = ratio(&query, &name);
        if !self.options.match_words {
            return whole;
        }
        name.split_whitespace()
            .map(|word| ratio(&query, word))
            .fold(whole, f32::max)
    }

    /// The best-scoring names at or above the cutoff, best first, at most
    /// `limit` of them. Ties keep name order.
    pub fn close_matches<'a, I>(&self, query: &str, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut scored: Vec<(f32, &str)> = names
            .into_iter()
            .map(|name| (self.similarity(query, name), name))
            .filter(|(score, _)| *score >= self.options.cutoff)
            .collect();
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.cmp(b.1))
        });
        scored
            .into_iter()
            .take(self.options.limit)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Union of the fuzzy name matches and `tagged`, deduplicated.
    pub fn search<'a, I>(&self, query: &str, names: I, tagged: Vec<String>) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut results: BTreeSet<String> = self.close_matches(query, names).into_iter().collect();
        results.extend(tagged);
        results
    }
}
