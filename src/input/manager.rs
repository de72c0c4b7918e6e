//! Input manager for loading resumes and job descriptions from disk

use crate::error::{Result, ResumeMatcherError};
use crate::input::document::Document;
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{
    DocumentTextExtractor, Extraction, MarkdownExtractor, PlainTextExtractor, TextExtractor,
};
use log::info;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;

pub struct InputManager {
    cache: HashMap<String, String>,
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Read a resume file. Only pdf and docx are accepted; anything else is
    /// rejected before the bytes are read.
    pub async fn load_document(&self, path: &Path) -> Result<Document> {
        self.ensure_exists(path)?;

        let file_type = self.detect_file_type(path)?;
        let format = file_type.document_format().ok_or_else(|| {
            ResumeMatcherError::UnsupportedFormat(format!(
                "Resume must be pdf or docx: {}",
                path.display()
            ))
        })?;

        info!("Loading {} resume: {}", format, path.display());
        let bytes = fs::read(path).await?;
        Ok(Document::new(bytes, format))
    }

    /// Read a job description from txt, md, pdf or docx. Job descriptions are
    /// mandatory input, so an unreadable one is an error rather than empty text.
    pub async fn read_job_description(
        &mut self,
        path: &Path,
        extractor: &DocumentTextExtractor,
    ) -> Result<String> {
        let path_str = path.to_string_lossy().to_string();

        if let Some(cached_text) = self.cache.get(&path_str) {
            info!("Using cached text for: {}", path.display());
            return Ok(cached_text.clone());
        }

        self.ensure_exists(path)?;
        let file_type = self.detect_file_type(path)?;
        let bytes = fs::read(path).await?;

        let text = match file_type {
            FileType::Text => {
                info!("Reading plain text job description: {}", path.display());
                PlainTextExtractor.extract(&bytes)?
            }
            FileType::Markdown => {
                info!("Processing markdown job description: {}", path.display());
                MarkdownExtractor.extract(&bytes)?
            }
            FileType::Pdf | FileType::Docx => {
                let format = file_type.document_format().ok_or_else(|| {
                    ResumeMatcherError::UnsupportedFormat(path.display().to_string())
                })?;
                let extraction = extractor.extract(&Document::new(bytes, format));
                if let Extraction::Failed { reason } = &extraction {
                    return Err(ResumeMatcherError::InvalidInput(format!(
                        "Could not read job description {}: {}",
                        path.display(),
                        reason
                    )));
                }
                extraction.into_text()
            }
            FileType::Unknown => {
                return Err(ResumeMatcherError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    path.display()
                )));
            }
        };

        self.cache.insert(path_str, text.clone());

        Ok(text)
    }

    fn ensure_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(ResumeMatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }
        Ok(())
    }

    fn detect_file_type(&self, path: &Path) -> Result<FileType> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ResumeMatcherError::InvalidInput(format!("File has no extension: {}", path.display()))
            })?;

        Ok(FileType::from_extension(extension))
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }
}
