//! Weighted fusion of lexical, semantic, skill and experience signals

use crate::error::{Result, ResumeMatcherError};
use crate::processing::embeddings::{cosine_similarity, Embedder};
use crate::processing::round2;
use crate::processing::skills::SkillSet;
use crate::processing::tfidf::TfidfVectorizer;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Fusion coefficients. Non-negative, summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub semantic: f64,
    pub lexical: f64,
    pub skill: f64,
    pub experience: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            semantic: 0.5,
            lexical: 0.2,
            skill: 0.2,
            experience: 0.1,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.semantic + self.lexical + self.skill + self.experience
    }

    pub fn validate(&self) -> Result<()> {
        let named = [
            ("semantic", self.semantic),
            ("lexical", self.lexical),
            ("skill", self.skill),
            ("experience", self.experience),
        ];

        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(ResumeMatcherError::Configuration(format!(
                    "Weight '{}' must be a non-negative number, got {}",
                    name, weight
                )));
            }
        }

        if (self.sum() - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ResumeMatcherError::Configuration(format!(
                "Score weights must sum to 1.0, got {}",
                self.sum()
            )));
        }

        Ok(())
    }
}

/// Maps years of experience to a weight in [0, 1], non-decreasing in years.
/// Zero years always maps to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExperienceCurve {
    Step {
        threshold_years: u32,
        below: f64,
        at_or_above: f64,
    },
    Linear {
        saturation_years: u32,
    },
}

impl Default for ExperienceCurve {
    fn default() -> Self {
        ExperienceCurve::Step {
            threshold_years: 3,
            below: 0.5,
            at_or_above: 1.0,
        }
    }
}

impl ExperienceCurve {
    pub fn weight(&self, years: u32) -> f64 {
        if years == 0 {
            return 0.0;
        }

        match *self {
            ExperienceCurve::Step {
                threshold_years,
                below,
                at_or_above,
            } => {
                if years >= threshold_years {
                    at_or_above
                } else {
                    below
                }
            }
            ExperienceCurve::Linear { saturation_years } => {
                (years as f64 / saturation_years as f64).min(1.0)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            ExperienceCurve::Step {
                threshold_years,
                below,
                at_or_above,
            } => {
                if threshold_years == 0 {
                    return Err(ResumeMatcherError::Configuration(
                        "Step curve threshold_years must be positive".to_string(),
                    ));
                }
                if !(0.0 <= below && below <= at_or_above && at_or_above <= 1.0) {
                    return Err(ResumeMatcherError::Configuration(format!(
                        "Step curve needs 0 <= below <= at_or_above <= 1, got {} and {}",
                        below, at_or_above
                    )));
                }
            }
            ExperienceCurve::Linear { saturation_years } => {
                if saturation_years == 0 {
                    return Err(ResumeMatcherError::Configuration(
                        "Linear curve saturation_years must be positive".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// The four signals, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentScores {
    pub lexical: f64,
    pub semantic: f64,
    pub skill_weight: f64,
    pub experience_weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Percentage in [0, 100], two decimals
    pub final_score: f64,
    pub components: ComponentScores,
}

impl MatchResult {
    /// Semantic component as a percentage, used to rank jobs for a resume
    pub fn semantic_rank(&self) -> f64 {
        round2(self.components.semantic * 100.0)
    }
}

pub struct SimilarityScorer {
    weights: ScoreWeights,
    curve: ExperienceCurve,
    embedder: Arc<dyn Embedder>,
    tfidf: TfidfVectorizer,
}

impl SimilarityScorer {
    pub fn new(weights: ScoreWeights, curve: ExperienceCurve, embedder: Arc<dyn Embedder>) -> Result<Self> {
        weights.validate()?;
        curve.validate()?;

        Ok(Self {
            weights,
            curve,
            embedder,
            tfidf: TfidfVectorizer::new()?,
        })
    }

    pub fn weights(&self) -> &ScoreWeights {
        &self.weights
    }

    pub fn score(&self, resume: &str, job: &str, skills: &SkillSet, years: u32) -> Result<MatchResult> {
        let components = ComponentScores {
            lexical: self.tfidf.similarity(resume, job),
            semantic: self.semantic_similarity(resume, job)?,
            skill_weight: skill_weight(skills, job),
            experience_weight: self.curve.weight(years),
        };

        let weighted = self.weights.lexical * components.lexical
            + self.weights.semantic * components.semantic
            + self.weights.skill * components.skill_weight
            + self.weights.experience * components.experience_weight;

        let final_score = round2(weighted.clamp(0.0, 1.0) * 100.0);

        debug!(
            "Match components: lexical={:.4} semantic={:.4} skill={:.4} experience={:.4} -> {:.2}",
            components.lexical,
            components.semantic,
            components.skill_weight,
            components.experience_weight,
            final_score
        );

        Ok(MatchResult {
            final_score,
            components,
        })
    }

    /// Embedding cosine clamped to [0, 1]. Blank input scores 0 without
    /// touching the model.
    pub fn semantic_similarity(&self, resume: &str, job: &str) -> Result<f64> {
        if resume.trim().is_empty() || job.trim().is_empty() {
            return Ok(0.0);
        }

        let embeddings = self.embedder.embed(&[resume.to_string(), job.to_string()])?;
        match embeddings.as_slice() {
            [a, b] => Ok((cosine_similarity(a, b)? as f64).clamp(0.0, 1.0)),
            other => Err(ResumeMatcherError::Embedding(format!(
                "Expected 2 embeddings from {}, got {}",
                self.embedder.name(),
                other.len()
            ))),
        }
    }
}

/// Fraction of extracted skills mentioned anywhere in the job text
pub fn skill_weight(skills: &SkillSet, job: &str) -> f64 {
    if skills.is_empty() {
        return 0.0;
    }

    let job = job.to_lowercase();
    let matched = skills
        .iter()
        .filter(|skill| job.contains(skill.to_lowercase().as_str()))
        .count();

    matched as f64 / skills.len() as f64
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Bag-of-words hashing embedder: deterministic and model-free
    pub(crate) struct HashingEmbedder {
        pub calls: AtomicUsize,
    }

    impl HashingEmbedder {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Embedder for HashingEmbedder {
        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(texts
                .iter()
                .map(|text| {
                    let mut v = vec![0.0f32; 32];
                    for word in text.to_lowercase().split_whitespace() {
                        let bucket = word.bytes().map(|b| b as usize).sum::<usize>() % 32;
                        v[bucket] += 1.0;
                    }
                    v
                })
                .collect())
        }

        fn name(&self) -> &str {
            "hashing"
        }
    }

    fn scorer() -> (SimilarityScorer, Arc<HashingEmbedder>) {
        let embedder = Arc::new(HashingEmbedder::new());
        let scorer =
            SimilarityScorer::new(ScoreWeights::default(), ExperienceCurve::default(), embedder.clone()).unwrap();
        (scorer, embedder)
    }

    fn skills(items: &[&str]) -> SkillSet {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_weights_are_valid() {
        let weights = ScoreWeights::default();
        assert!(weights.validate().is_ok());
        assert!((weights.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_weights_rejected() {
        let mut weights = ScoreWeights::default();
        weights.lexical = 0.3;
        assert!(matches!(weights.validate(), Err(ResumeMatcherError::Configuration(_))));

        let negative = ScoreWeights {
            semantic: 1.2,
            lexical: -0.2,
            skill: 0.0,
            experience: 0.0,
        };
        assert!(negative.validate().is_err());

        let embedder: Arc<dyn Embedder> = Arc::new(HashingEmbedder::new());
        assert!(SimilarityScorer::new(weights, ExperienceCurve::default(), embedder).is_err());
    }

    #[test]
    fn test_experience_curves_are_monotonic() {
        let step = ExperienceCurve::default();
        assert_eq!(step.weight(0), 0.0);
        assert_eq!(step.weight(2), 0.5);
        assert_eq!(step.weight(3), 1.0);
        assert_eq!(step.weight(40), 1.0);

        let linear = ExperienceCurve::Linear { saturation_years: 10 };
        assert_eq!(linear.weight(5), 0.5);
        assert_eq!(linear.weight(25), 1.0);

        for curve in [step, linear] {
            let weights: Vec<f64> = (0..60).map(|y| curve.weight(y)).collect();
            assert!(weights.windows(2).all(|w| w[0] <= w[1]));
            assert!(weights.iter().all(|w| (0.0..=1.0).contains(w)));
        }
    }

    #[test]
    fn test_invalid_curves_rejected() {
        let inverted = ExperienceCurve::Step {
            threshold_years: 3,
            below: 0.9,
            at_or_above: 0.4,
        };
        assert!(inverted.validate().is_err());
        assert!(ExperienceCurve::Linear { saturation_years: 0 }.validate().is_err());
    }

    #[test]
    fn test_skill_weight_is_fraction_found_in_job() {
        let job = "We need a Python developer for data pipelines";
        assert_eq!(skill_weight(&skills(&["python", "sql"]), job), 0.5);
        assert_eq!(skill_weight(&SkillSet::new(), job), 0.0);
    }

    #[test]
    fn test_identical_texts_score_near_maximum() {
        let (scorer, _) = scorer();
        let text = "Rust engineer with python and docker experience";

        let result = scorer.score(text, text, &skills(&["python", "docker"]), 5).unwrap();

        assert!((result.components.lexical - 1.0).abs() < 1e-9);
        assert!((result.components.semantic - 1.0).abs() < 1e-6);
        assert_eq!(result.components.skill_weight, 1.0);
        assert!(result.final_score > 99.9);
        assert!(result.final_score <= 100.0);
    }

    #[test]
    fn test_blank_resume_skips_embedder() {
        let (scorer, embedder) = scorer();

        let result = scorer.score("", "Python developer", &SkillSet::new(), 0).unwrap();

        assert_eq!(result.final_score, 0.0);
        assert_eq!(result.components.semantic, 0.0);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_scoring_is_idempotent() {
        let (scorer, _) = scorer();
        let resume = "Backend developer, 6 years, python sql kafka";
        let job = "Hiring a python backend engineer familiar with kafka";
        let set = skills(&["python", "sql", "kafka"]);

        let first = scorer.score(resume, job, &set, 6).unwrap();
        let second = scorer.score(resume, job, &set, 6).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.final_score.to_bits(), second.final_score.to_bits());
    }

    #[test]
    fn test_linear_curve_drives_experience_component() {
        let experience_only = ScoreWeights {
            semantic: 0.0,
            lexical: 0.0,
            skill: 0.0,
            experience: 1.0,
        };
        let scorer = SimilarityScorer::new(
            experience_only,
            ExperienceCurve::Linear { saturation_years: 10 },
            Arc::new(HashingEmbedder::new()),
        )
        .unwrap();

        let mid = scorer.score("engineer", "engineer", &SkillSet::new(), 4).unwrap();
        assert_eq!(mid.components.experience_weight, 0.4);
        assert_eq!(mid.final_score, 40.0);

        let saturated = scorer.score("engineer", "engineer", &SkillSet::new(), 15).unwrap();
        assert_eq!(saturated.final_score, 100.0);
    }

    #[test]
    fn test_semantic_rank_is_percentage() {
        let (scorer, _) = scorer();
        let rank = scorer
            .score("python developer", "python developer", &SkillSet::new(), 0)
            .unwrap()
            .semantic_rank();
        assert_eq!(rank, 100.0);
    }
}
