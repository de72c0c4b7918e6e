//! ATS (Applicant Tracking System) compatibility screening
//!
//! A fixed eight-category rubric; each category is one case-insensitive
//! pattern test. Independent of any job description.

use crate::config::AtsConfig;
use crate::error::{Result, ResumeMatcherError};
use crate::processing::round2;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ATS_FRIENDLY: &str = "Resume is ATS-friendly.";

const SECTIONS: [&str; 4] = ["experience", "skills", "education", "projects"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsCategory {
    ContactInformation,
    Education,
    Experience,
    Skills,
    Keywords,
    NoImages,
    ProperFormatting,
    BulletPoints,
}

impl AtsCategory {
    pub const ALL: [AtsCategory; 8] = [
        AtsCategory::ContactInformation,
        AtsCategory::Education,
        AtsCategory::Experience,
        AtsCategory::Skills,
        AtsCategory::Keywords,
        AtsCategory::NoImages,
        AtsCategory::ProperFormatting,
        AtsCategory::BulletPoints,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AtsCategory::ContactInformation => "contact information",
            AtsCategory::Education => "education",
            AtsCategory::Experience => "experience",
            AtsCategory::Skills => "skills",
            AtsCategory::Keywords => "keywords",
            AtsCategory::NoImages => "no images",
            AtsCategory::ProperFormatting => "proper formatting",
            AtsCategory::BulletPoints => "bullet points",
        }
    }

    fn pattern(self) -> &'static str {
        match self {
            AtsCategory::ContactInformation => r"(?i)\b(?:phone|email|e-mail|linkedin|github)\b",
            AtsCategory::Education => r"(?i)\b(?:bachelor|master|phd|degree|university|college)",
            AtsCategory::Experience => r"(?i)\b(?:experience|worked at|position|years)\b",
            AtsCategory::Skills => r"(?i)\b(?:skills|technologies|expertise)\b",
            AtsCategory::Keywords => {
                r"(?i)\b(?:python|java|ml|data science|tensorflow|react|aws|sql)\b"
            }
            // Matches an image reference; the category passes when this does NOT match
            AtsCategory::NoImages => r"(?i)\b(?:jpe?g|png|gif|image)\b",
            AtsCategory::ProperFormatting => r"(?i)\b(?:pdf|docx)\b",
            AtsCategory::BulletPoints => r"(?m)[•▪●◦]|^\s*[-*]\s+\S|^\s*\d+\.\s",
        }
    }
}

impl fmt::Display for AtsCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtsResult {
    pub score: f64,
    pub feedback: String,
    pub missing: Vec<AtsCategory>,
}

impl AtsResult {
    pub fn passed(&self) -> bool {
        self.missing.is_empty() || self.feedback == ATS_FRIENDLY
    }
}

pub struct AtsScreener {
    rules: Vec<(AtsCategory, Regex)>,
    pass_threshold: f64,
    sanitizer: Regex,
}

impl AtsScreener {
    pub fn new(config: &AtsConfig) -> Result<Self> {
        let rules = AtsCategory::ALL
            .iter()
            .map(|category| Ok((*category, compile(category.pattern())?)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            pass_threshold: config.pass_threshold,
            sanitizer: compile(r"[^A-Za-z0-9\s.,]")?,
        })
    }

    pub fn screen(&self, text: &str) -> AtsResult {
        let missing: Vec<AtsCategory> = if text.trim().is_empty() {
            AtsCategory::ALL.to_vec()
        } else {
            self.rules
                .iter()
                .filter(|(category, pattern)| {
                    let found = pattern.is_match(text);
                    if *category == AtsCategory::NoImages {
                        found
                    } else {
                        !found
                    }
                })
                .map(|(category, _)| *category)
                .collect()
        };

        let total = self.rules.len() as f64;
        let present = total - missing.len() as f64;
        let score = round2(present / total * 100.0);

        let feedback = if missing.is_empty() || score > self.pass_threshold {
            ATS_FRIENDLY.to_string()
        } else {
            let labels: Vec<&str> = missing.iter().map(|c| c.label()).collect();
            format!("Missing: {}", labels.join(", "))
        };

        AtsResult {
            score,
            feedback,
            missing,
        }
    }

    /// Standard resume sections not mentioned anywhere in the text
    pub fn missing_sections(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        SECTIONS
            .iter()
            .filter(|section| !lower.contains(*section))
            .map(|section| section.to_string())
            .collect()
    }

    /// Strip everything outside letters, digits, whitespace, periods and commas
    pub fn sanitize(&self, text: &str) -> String {
        self.sanitizer.replace_all(text, "").into_owned()
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern)
        .map_err(|e| ResumeMatcherError::TextProcessing(format!("Invalid ATS pattern: {}", e)))
}
