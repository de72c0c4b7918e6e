//! Text normalization and keyword extraction

use std::collections::{HashMap, HashSet};
use unicode_segmentation::UnicodeSegmentation;

pub struct TextProcessor {
    stop_words: HashSet<&'static str>,
}

impl Default for TextProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextProcessor {
    pub fn new() -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
        }
    }

    /// Tokenize text into lower-cased words using Unicode segmentation,
    /// dropping stop words, one-letter words and pure numbers
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|word| word.chars().count() > 1)
            .filter(|word| !self.stop_words.contains(word.as_str()))
            .filter(|word| word.chars().any(char::is_alphabetic))
            .collect()
    }

    /// Most frequent non-stop-word terms longer than two characters.
    /// Ties keep the order in which the words first appeared.
    pub fn extract_keywords(&self, text: &str, max_keywords: usize) -> Vec<(String, usize)> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();

        for (position, token) in self.tokenize(text).into_iter().enumerate() {
            if token.chars().count() > 2 {
                counts.entry(token).or_insert((0, position)).0 += 1;
            }
        }

        let mut keywords: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        keywords.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

        keywords
            .into_iter()
            .take(max_keywords)
            .map(|(word, (count, _))| (word, count))
            .collect()
    }
}

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "aren't", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "couldn't", "did", "didn't", "do", "does", "doesn't", "doing", "don't",
    "down", "during", "each", "few", "for", "from", "further", "had", "hadn't", "has", "hasn't",
    "have", "haven't", "having", "he", "her", "here", "hers", "herself", "him", "himself", "his",
    "how", "i", "if", "in", "into", "is", "isn't", "it", "it's", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "she's",
    "should", "shouldn't", "so", "some", "such", "than", "that", "that'll", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "wasn't", "we", "were", "weren't", "what",
    "when", "where", "which", "while", "who", "whom", "why", "will", "with", "won't", "would",
    "wouldn't", "you", "you'd", "you'll", "you're", "you've", "your", "yours", "yourself",
    "yourselves",
];
