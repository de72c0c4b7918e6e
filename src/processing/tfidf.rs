//! Lexical similarity between two documents
//!
//! The vocabulary and document frequencies come from exactly the two texts
//! being compared. Term weighting follows the common smoothed TF-IDF scheme:
//! raw counts, `idf = ln((1 + n) / (1 + df)) + 1`, L2-normalized rows.

use crate::error::{Result, ResumeMatcherError};
use regex::Regex;
use std::collections::BTreeMap;

pub struct TfidfVectorizer {
    token: Regex,
}

impl TfidfVectorizer {
    pub fn new() -> Result<Self> {
        let token = Regex::new(r"\b\w\w+\b")
            .map_err(|e| ResumeMatcherError::TextProcessing(format!("Invalid token pattern: {}", e)))?;
        Ok(Self { token })
    }

    /// Lower-cased tokens of two or more word characters
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.token
            .find_iter(&lower)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Fit on `[first, second]` and return both L2-normalized vectors.
    /// Terms are keyed in a `BTreeMap` so summation order never varies.
    pub fn fit_transform(&self, first: &str, second: &str) -> (BTreeMap<String, f64>, BTreeMap<String, f64>) {
        let first = self.term_counts(first);
        let second = self.term_counts(second);

        let n_docs = 2.0_f64;
        let idf = |term: &str| {
            let df = [&first, &second].iter().filter(|doc| doc.contains_key(term)).count() as f64;
            ((1.0 + n_docs) / (1.0 + df)).ln() + 1.0
        };

        let weigh = |counts: &BTreeMap<String, f64>| {
            let mut weights: BTreeMap<String, f64> = counts
                .iter()
                .map(|(term, tf)| (term.clone(), tf * idf(term.as_str())))
                .collect();
            let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
            if norm > 0.0 {
                weights.values_mut().for_each(|w| *w /= norm);
            }
            weights
        };

        (weigh(&first), weigh(&second))
    }

    /// Cosine similarity of the two TF-IDF vectors, in [0, 1]
    pub fn similarity(&self, first: &str, second: &str) -> f64 {
        let (a, b) = self.fit_transform(first, second);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        let dot: f64 = a
            .iter()
            .filter_map(|(term, wa)| b.get(term).map(|wb| wa * wb))
            .sum();

        dot.clamp(0.0, 1.0)
    }

    fn term_counts(&self, text: &str) -> BTreeMap<String, f64> {
        let mut counts = BTreeMap::new();
        for token in self.tokenize(text) {
            *counts.entry(token).or_insert(0.0) += 1.0;
        }
        counts
    }
}
