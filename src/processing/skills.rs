//! Skill extraction against a fixed vocabulary
//!
//! Two strategies share one extractor: exact phrase lookup through an
//! Aho-Corasick automaton, and fuzzy lookup scoring token windows with
//! string similarity. Both return canonical vocabulary spellings.

use crate::config::SkillConfig;
use crate::error::{Result, ResumeMatcherError};
use aho_corasick::{AhoCorasick, MatchKind};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::Arc;
use strsim::{jaro_winkler, normalized_levenshtein};

pub type SkillSet = BTreeSet<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillStrategy {
    Exact,
    Fuzzy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FuzzyAlgorithm {
    Levenshtein,
    JaroWinkler,
}

impl FuzzyAlgorithm {
    /// Similarity on a 0-100 scale
    fn score(self, a: &str, b: &str) -> f64 {
        let similarity = match self {
            FuzzyAlgorithm::Levenshtein => normalized_levenshtein(a, b),
            FuzzyAlgorithm::JaroWinkler => jaro_winkler(a, b),
        };
        similarity * 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartOfSpeech {
    Noun,
    ProperNoun,
    Verb,
    Adjective,
    Other,
}

impl PartOfSpeech {
    pub fn is_nominal(self) -> bool {
        matches!(self, PartOfSpeech::Noun | PartOfSpeech::ProperNoun)
    }
}

/// Grammatical tagger used to restrict fuzzy matching to nouns.
/// Implementations must return exactly one tag per token.
pub trait PartOfSpeechTagger: Send + Sync {
    fn tag(&self, tokens: &[String]) -> Vec<PartOfSpeech>;
}

/// Tags every token as a noun, so nothing is filtered out
#[derive(Debug, Default, Clone, Copy)]
pub struct OpenClassTagger;

impl PartOfSpeechTagger for OpenClassTagger {
    fn tag(&self, tokens: &[String]) -> Vec<PartOfSpeech> {
        vec![PartOfSpeech::Noun; tokens.len()]
    }
}

/// Ordered, de-duplicated, lower-cased skill phrases
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillVocabulary {
    entries: Vec<String>,
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::from_entries(DEFAULT_SKILLS.iter().copied())
    }
}

impl SkillVocabulary {
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .map(|entry| normalize_phrase(entry.as_ref()))
            .filter(|entry| !entry.is_empty())
            .filter(|entry| seen.insert(entry.clone()))
            .collect();

        Self { entries }
    }

    /// One phrase per line, blank lines and `#` comments skipped
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let vocabulary = Self::from_entries(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.starts_with('#')),
        );

        if vocabulary.is_empty() {
            return Err(ResumeMatcherError::Configuration(format!(
                "Skill vocabulary {} contains no entries",
                path.display()
            )));
        }

        debug!("Loaded {} skills from {}", vocabulary.len(), path.display());
        Ok(vocabulary)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn contains(&self, skill: &str) -> bool {
        self.entries.iter().any(|entry| entry == skill)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Word count of the longest phrase
    fn max_phrase_words(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.split_whitespace().count())
            .max()
            .unwrap_or(0)
    }
}

fn normalize_phrase(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub struct SkillExtractor {
    vocabulary: Arc<SkillVocabulary>,
    strategy: SkillStrategy,
    exact_matcher: AhoCorasick,
    fuzzy_threshold: f64,
    fuzzy_algorithm: FuzzyAlgorithm,
    nouns_only: bool,
    tagger: Arc<dyn PartOfSpeechTagger>,
    entry_words: Vec<usize>,
    max_window: usize,
}

impl SkillExtractor {
    pub fn new(
        vocabulary: Arc<SkillVocabulary>,
        config: &SkillConfig,
        tagger: Arc<dyn PartOfSpeechTagger>,
    ) -> Result<Self> {
        // Standard match kind is required for overlapping iteration
        let exact_matcher = AhoCorasick::builder()
            .ascii_case_insensitive(true)
            .match_kind(MatchKind::Standard)
            .build(vocabulary.entries())
            .map_err(|e| {
                ResumeMatcherError::Processing(format!("Failed to build skill matcher: {}", e))
            })?;

        let entry_words = vocabulary
            .entries()
            .iter()
            .map(|entry| entry.split_whitespace().count())
            .collect();
        let max_window = vocabulary.max_phrase_words();

        Ok(Self {
            vocabulary,
            strategy: config.strategy,
            exact_matcher,
            fuzzy_threshold: config.fuzzy_threshold,
            fuzzy_algorithm: config.fuzzy_algorithm,
            nouns_only: config.nouns_only,
            tagger,
            entry_words,
            max_window,
        })
    }

    pub fn strategy(&self) -> SkillStrategy {
        self.strategy
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    /// Extract skills with the configured strategy
    pub fn extract(&self, text: &str) -> SkillSet {
        self.extract_with(text, self.strategy)
    }

    pub fn extract_with(&self, text: &str, strategy: SkillStrategy) -> SkillSet {
        if text.trim().is_empty() {
            return SkillSet::new();
        }

        let skills = match strategy {
            SkillStrategy::Exact => self.extract_exact(text),
            SkillStrategy::Fuzzy => self.extract_fuzzy(text),
        };

        debug!("{:?} skill extraction found {} skills", strategy, skills.len());
        skills
    }

    fn extract_exact(&self, text: &str) -> SkillSet {
        // Collapse whitespace so phrases split across lines still match
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut skills = SkillSet::new();

        for mat in self.exact_matcher.find_overlapping_iter(&text) {
            if is_word_bounded(&text, mat.start(), mat.end()) {
                skills.insert(self.vocabulary.entries()[mat.pattern().as_usize()].clone());
            }
        }

        skills
    }

    fn extract_fuzzy(&self, text: &str) -> SkillSet {
        let tokens = fuzzy_tokens(text);
        if tokens.is_empty() || self.max_window == 0 {
            return SkillSet::new();
        }

        let candidate = if self.nouns_only {
            let tags = self.tagger.tag(&tokens);
            if tags.len() != tokens.len() {
                debug!(
                    "Tagger returned {} tags for {} tokens, skipping noun filter",
                    tags.len(),
                    tokens.len()
                );
                vec![true; tokens.len()]
            } else {
                tags.into_iter().map(PartOfSpeech::is_nominal).collect()
            }
        } else {
            vec![true; tokens.len()]
        };

        let mut skills = SkillSet::new();

        for start in 0..tokens.len() {
            for len in 1..=self.max_window {
                let end = start + len;
                if end > tokens.len() || !candidate[start..end].iter().all(|c| *c) {
                    break;
                }

                let window = tokens[start..end].join(" ");
                if let Some(skill) = self.best_fuzzy_match(&window, len) {
                    skills.insert(skill.to_string());
                }
            }
        }

        skills
    }

    /// Best vocabulary entry with `words` words, if it clears the threshold.
    /// The earlier entry wins a tie.
    fn best_fuzzy_match(&self, window: &str, words: usize) -> Option<&str> {
        let mut best: Option<(usize, f64)> = None;

        for (index, entry) in self.vocabulary.entries().iter().enumerate() {
            if self.entry_words[index] != words {
                continue;
            }

            let score = self.fuzzy_algorithm.score(window, entry);
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        best.filter(|(_, score)| *score > self.fuzzy_threshold)
            .map(|(index, _)| self.vocabulary.entries()[index].as_str())
    }
}

fn is_word_bounded(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();

    !before.map_or(false, char::is_alphanumeric) && !after.map_or(false, char::is_alphanumeric)
}

/// Lower-cased tokens; anything except alphanumerics and `+#.` separates tokens
fn fuzzy_tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|token| token.trim_matches('.'))
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

const DEFAULT_SKILLS: &[&str] = &[
    "python", "java", "c++", "c#", "javascript", "typescript", "rust", "ruby", "php", "scala",
    "kotlin", "swift", "sql", "react", "angular", "vue", "node.js", "html", "css", "flask",
    "django", "fastapi", "spring", "machine learning", "deep learning", "nlp", "data science",
    "computer vision", "cv", "llm", "tensorflow", "pytorch", "keras", "bert", "transformers",
    "scikit-learn", "pandas", "numpy", "matplotlib", "mlops", "spark", "hadoop", "kafka",
    "airflow", "docker", "kubernetes", "terraform", "ansible", "jenkins", "aws", "azure", "gcp",
    "linux", "git", "bash", "microservices", "rest", "graphql", "grpc", "mongodb", "postgresql",
    "mysql", "redis", "elasticsearch", "agile", "scrum", "kanban", "project management",
    "leadership", "communication",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn extractor(strategy: SkillStrategy) -> SkillExtractor {
        let mut config = Config::default().skills;
        config.strategy = strategy;
        SkillExtractor::new(
            Arc::new(SkillVocabulary::default()),
            &config,
            Arc::new(OpenClassTagger),
        )
        .unwrap()
    }

    struct VerbTagger;

    impl PartOfSpeechTagger for VerbTagger {
        fn tag(&self, tokens: &[String]) -> Vec<PartOfSpeech> {
            tokens
                .iter()
                .map(|t| if t == "python" { PartOfSpeech::Verb } else { PartOfSpeech::Noun })
                .collect()
        }
    }

    #[test]
    fn test_vocabulary_normalizes_and_dedups() {
        let vocab = SkillVocabulary::from_entries(["Python", "  Machine   Learning ", "python", ""]);
        assert_eq!(vocab.entries(), &["python".to_string(), "machine learning".to_string()]);
        assert_eq!(vocab.max_phrase_words(), 2);
    }

    #[test]
    fn test_vocabulary_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("skills.txt");
        std::fs::write(&path, "# tools\nRust\n\nTokio\n").unwrap();

        let vocab = SkillVocabulary::from_file(&path).unwrap();
        assert_eq!(vocab.entries(), &["rust".to_string(), "tokio".to_string()]);

        std::fs::write(&path, "# nothing here\n").unwrap();
        assert!(SkillVocabulary::from_file(&path).is_err());
    }

    #[test]
    fn test_exact_matching_respects_word_boundaries() {
        let extractor = extractor(SkillStrategy::Exact);
        let skills = extractor.extract("Built APIs in Python with PostgreSQL and JavaScript.");

        assert!(skills.contains("python"));
        assert!(skills.contains("postgresql"));
        assert!(skills.contains("javascript"));
        // Substrings of longer words are not hits
        assert!(!skills.contains("sql"));
        assert!(!skills.contains("java"));
    }

    #[test]
    fn test_exact_matching_multi_word_across_lines() {
        let extractor = extractor(SkillStrategy::Exact);
        let skills = extractor.extract("Applied MACHINE\nlearning to C++ and C# services");

        assert!(skills.contains("machine learning"));
        assert!(skills.contains("c++"));
        assert!(skills.contains("c#"));
    }

    #[test]
    fn test_fuzzy_matching_tolerates_typos() {
        let extractor = extractor(SkillStrategy::Fuzzy);
        let skills = extractor.extract("Experienced with Pythn, Kubernets and machne learning");

        assert!(skills.contains("python"));
        assert!(skills.contains("kubernetes"));
        assert!(skills.contains("machine learning"));
    }

    fn fuzzy_extractor(entries: &[&str], algorithm: FuzzyAlgorithm, threshold: f64) -> SkillExtractor {
        let mut config = Config::default().skills;
        config.strategy = SkillStrategy::Fuzzy;
        config.fuzzy_algorithm = algorithm;
        config.fuzzy_threshold = threshold;
        SkillExtractor::new(
            Arc::new(SkillVocabulary::from_entries(entries.iter().copied())),
            &config,
            Arc::new(OpenClassTagger),
        )
        .unwrap()
    }

    #[test]
    fn test_fuzzy_threshold_is_exclusive() {
        // "trust" vs "rust" is exactly 80 under normalized Levenshtein
        assert_eq!(FuzzyAlgorithm::Levenshtein.score("trust", "rust"), 80.0);

        let strict = fuzzy_extractor(&["rust"], FuzzyAlgorithm::Levenshtein, 80.0);
        assert!(strict.extract("I trust the process").is_empty());

        let lenient = fuzzy_extractor(&["rust"], FuzzyAlgorithm::Levenshtein, 79.9);
        assert!(lenient.extract("I trust the process").contains("rust"));
    }

    #[test]
    fn test_jaro_winkler_is_selectable() {
        let extractor = fuzzy_extractor(&["rust", "python"], FuzzyAlgorithm::JaroWinkler, 80.0);

        assert!(FuzzyAlgorithm::JaroWinkler.score("trust", "rust") > 90.0);
        let skills = extractor.extract("trust and pythn");
        assert!(skills.contains("rust"));
        assert!(skills.contains("python"));
    }

    #[test]
    fn test_fuzzy_matching_honours_tagger() {
        let mut config = Config::default().skills;
        config.strategy = SkillStrategy::Fuzzy;
        let extractor = SkillExtractor::new(
            Arc::new(SkillVocabulary::default()),
            &config,
            Arc::new(VerbTagger),
        )
        .unwrap();

        let skills = extractor.extract("python docker");
        assert!(!skills.contains("python"));
        assert!(skills.contains("docker"));

        config.nouns_only = false;
        let unrestricted = SkillExtractor::new(
            Arc::new(SkillVocabulary::default()),
            &config,
            Arc::new(VerbTagger),
        )
        .unwrap();
        assert!(unrestricted.extract("python docker").contains("python"));
    }

    #[test]
    fn test_results_are_vocabulary_subset() {
        let text = "Senior engineer: Rust, Go, Kafka, Redis, Terraform, leadership";
        for strategy in [SkillStrategy::Exact, SkillStrategy::Fuzzy] {
            let extractor = extractor(strategy);
            for skill in extractor.extract(text) {
                assert!(extractor.vocabulary().contains(&skill), "{} not in vocabulary", skill);
            }
        }
    }

    #[test]
    fn test_empty_text_yields_no_skills() {
        assert!(extractor(SkillStrategy::Exact).extract("").is_empty());
        assert!(extractor(SkillStrategy::Fuzzy).extract("   \n").is_empty());
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let extractor = extractor(SkillStrategy::Fuzzy);
        let text = "pythn, dockr, kubernetes, reactt";
        assert_eq!(extractor.extract(text), extractor.extract(text));
    }
}
