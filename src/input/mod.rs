//! Input processing module
//! Handles file detection, text extraction, and input management

pub mod document;
pub mod file_detector;
pub mod manager;
pub mod ocr;
pub mod text_extractor;

pub use document::{Document, DocumentFormat};
pub use text_extractor::{DocumentTextExtractor, Extraction, ExtractionMethod, ExtractionStatus};
