//! Uploaded resume documents

use crate::error::{Result, ResumeMatcherError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Formats a resume may be declared as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl FromStr for DocumentFormat {
    type Err = ResumeMatcherError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().trim_start_matches('.').to_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(ResumeMatcherError::UnsupportedFormat(format!(
                "'{}' (supported: pdf, docx)",
                other
            ))),
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "pdf"),
            DocumentFormat::Docx => write!(f, "docx"),
        }
    }
}

/// Raw resume bytes plus the declared format. Consumed once by text extraction.
#[derive(Debug, Clone)]
pub struct Document {
    pub bytes: Vec<u8>,
    pub format: DocumentFormat,
}

impl Document {
    pub fn new(bytes: Vec<u8>, format: DocumentFormat) -> Self {
        Self { bytes, format }
    }

    /// Build from a caller-supplied format tag, rejecting unknown formats up front
    pub fn from_tagged(bytes: Vec<u8>, format_tag: &str) -> Result<Self> {
        let format = format_tag.parse()?;
        Ok(Self::new(bytes, format))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
