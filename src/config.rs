//! Configuration management for the resume matcher

use crate::error::{Result, ResumeMatcherError};
use crate::processing::experience::RangePolicy;
use crate::processing::similarity::{ExperienceCurve, ScoreWeights};
use crate::processing::skills::{FuzzyAlgorithm, SkillStrategy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub models: ModelConfig,
    pub extraction: ExtractionConfig,
    pub skills: SkillConfig,
    pub experience: ExperienceConfig,
    pub scoring: ScoringConfig,
    pub ats: AtsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// HuggingFace repo id or local directory of a Model2Vec model
    pub embedding_model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub ocr_enabled: bool,
    pub ocr_dpi: u32,
    pub ocr_language: String,
    /// Tesseract page segmentation mode
    pub ocr_page_segmentation: u32,
    /// Adaptive threshold neighbourhood is (2r + 1) x (2r + 1) pixels
    pub threshold_block_radius: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillConfig {
    pub strategy: SkillStrategy,
    /// Minimum similarity on a 0-100 scale for a fuzzy hit
    pub fuzzy_threshold: f64,
    pub fuzzy_algorithm: FuzzyAlgorithm,
    /// Only consider noun / proper-noun tokens in fuzzy mode
    pub nouns_only: bool,
    /// One skill phrase per line; the built-in vocabulary is used when unset
    pub vocabulary_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceConfig {
    pub range_policy: RangePolicy,
    pub max_plausible_years: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub experience_curve: ExperienceCurve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtsConfig {
    /// Scores strictly above this get the ATS-friendly message
    pub pass_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
    pub keyword_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelConfig {
                embedding_model: "minishlab/potion-base-8M".to_string(),
            },
            extraction: ExtractionConfig {
                ocr_enabled: true,
                ocr_dpi: 300,
                ocr_language: "eng".to_string(),
                ocr_page_segmentation: 6,
                threshold_block_radius: 5,
            },
            skills: SkillConfig {
                strategy: SkillStrategy::Exact,
                fuzzy_threshold: 80.0,
                fuzzy_algorithm: FuzzyAlgorithm::Levenshtein,
                nouns_only: true,
                vocabulary_file: None,
            },
            experience: ExperienceConfig {
                range_policy: RangePolicy::UpperBound,
                max_plausible_years: 50,
            },
            scoring: ScoringConfig {
                weights: ScoreWeights::default(),
                experience_curve: ExperienceCurve::default(),
            },
            ats: AtsConfig {
                pass_threshold: 70.0,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
                keyword_count: 10,
            },
        }
    }
}

impl Config {
    /// Load from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ResumeMatcherError::Configuration(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| ResumeMatcherError::Configuration(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-matcher")
            .join("config.toml")
    }

    /// Reject tunables the scoring pipeline cannot honour
    pub fn validate(&self) -> Result<()> {
        self.scoring.weights.validate()?;
        self.scoring.experience_curve.validate()?;

        if !(0.0..=100.0).contains(&self.skills.fuzzy_threshold) {
            return Err(ResumeMatcherError::Configuration(format!(
                "skills.fuzzy_threshold must be within 0-100, got {}",
                self.skills.fuzzy_threshold
            )));
        }

        if !(0.0..=100.0).contains(&self.ats.pass_threshold) {
            return Err(ResumeMatcherError::Configuration(format!(
                "ats.pass_threshold must be within 0-100, got {}",
                self.ats.pass_threshold
            )));
        }

        if self.extraction.ocr_dpi == 0 {
            return Err(ResumeMatcherError::Configuration(
                "extraction.ocr_dpi must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
