//! Text extraction from various file formats

use crate::config::ExtractionConfig;
use crate::error::{Result, ResumeMatcherError};
use crate::input::document::{Document, DocumentFormat};
use crate::input::ocr::OcrEngine;
use log::{debug, info, warn};
use lopdf::{Object, ObjectId};
use pulldown_cmark::{html, Parser};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{Cursor, Read};

pub trait TextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Which pass produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    TextLayer,
    Layout,
    Ocr,
    Docx,
    PlainText,
    Markdown,
}

/// Outcome of pulling text out of a document. Failure is a value, not an error,
/// so scoring can carry on with empty text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted { text: String, method: ExtractionMethod },
    Failed { reason: String },
}

impl Extraction {
    /// Extracted text, or the empty string when extraction failed
    pub fn text(&self) -> &str {
        match self {
            Extraction::Extracted { text, .. } => text,
            Extraction::Failed { .. } => "",
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Extraction::Extracted { text, .. } => text,
            Extraction::Failed { .. } => String::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed { .. })
    }

    pub fn status(&self) -> ExtractionStatus {
        match self {
            Extraction::Extracted { text, method } => ExtractionStatus {
                succeeded: true,
                method: Some(*method),
                characters: text.chars().count(),
                failure_reason: None,
            },
            Extraction::Failed { reason } => ExtractionStatus {
                succeeded: false,
                method: None,
                characters: 0,
                failure_reason: Some(reason.clone()),
            },
        }
    }
}

/// Serializable summary of an [`Extraction`] for reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionStatus {
    pub succeeded: bool,
    pub method: Option<ExtractionMethod>,
    pub characters: usize,
    pub failure_reason: Option<String>,
}

/// PDF extraction: embedded text layer first, layout-aware pass second, OCR last
pub struct PdfExtractor {
    ocr: Option<OcrEngine>,
}

impl PdfExtractor {
    pub fn new(ocr: Option<OcrEngine>) -> Self {
        Self { ocr }
    }

    pub fn without_ocr() -> Self {
        Self { ocr: None }
    }

    /// Walks the passes in cost order and reports which one produced text.
    /// A PDF whose structure lopdf rejects, including a looping page tree,
    /// fails here without reaching the later passes.
    pub fn extract_with_method(&self, bytes: &[u8]) -> Result<(String, ExtractionMethod)> {
        let doc = Self::load(bytes)?;

        let text = Self::text_layer(&doc);
        if !text.trim().is_empty() {
            return Ok((text, ExtractionMethod::TextLayer));
        }
        debug!("PDF text layer is empty, trying layout extraction");

        let mut last_error = None;
        match Self::layout(bytes) {
            Ok(text) if !text.trim().is_empty() => return Ok((text, ExtractionMethod::Layout)),
            Ok(_) => debug!("Layout extraction produced no text"),
            Err(e) => {
                debug!("Layout extraction failed: {}", e);
                last_error = Some(e);
            }
        }

        if let Some(ocr) = &self.ocr {
            if OcrEngine::is_available() {
                let text = ocr.extract(bytes, doc.get_pages().len())?;
                if !text.trim().is_empty() {
                    return Ok((text, ExtractionMethod::Ocr));
                }
                last_error = Some(ResumeMatcherError::Ocr("OCR produced no text".to_string()));
            } else {
                warn!("PDF has no extractable text and OCR tools are not installed");
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ResumeMatcherError::PdfExtraction("PDF contains no extractable text".to_string())
        }))
    }

    fn load(bytes: &[u8]) -> Result<lopdf::Document> {
        let doc = lopdf::Document::load_mem(bytes)
            .map_err(|e| ResumeMatcherError::PdfExtraction(format!("Failed to load PDF: {}", e)))?;
        check_page_tree(&doc)?;
        Ok(doc)
    }

    /// Text objects of every page, one page per line. Unreadable pages are skipped.
    fn text_layer(doc: &lopdf::Document) -> String {
        let mut text = String::new();
        for page_num in doc.get_pages().keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(content) => {
                    text.push_str(&content);
                    text.push('\n');
                }
                Err(e) => debug!("Skipping unreadable PDF page {}: {}", page_num, e),
            }
        }
        text
    }

    fn layout(bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs
        std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
            .map_err(|_| ResumeMatcherError::PdfExtraction("Layout extractor panicked".to_string()))?
            .map_err(|e| {
                ResumeMatcherError::PdfExtraction(format!("Layout extraction failed: {}", e))
            })
    }
}

/// Rejects page trees that revisit a node through `/Kids` or `/Parent`
fn check_page_tree(doc: &lopdf::Document) -> Result<()> {
    let pages = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .and_then(|root| doc.get_dictionary(root))
        .and_then(|catalog| catalog.get(b"Pages"))
        .and_then(Object::as_reference)
        .map_err(malformed_tree)?;

    let mut visited = HashSet::new();
    let mut stack = vec![pages];
    while let Some(node_id) = stack.pop() {
        if !visited.insert(node_id) {
            return Err(cyclic_tree(node_id));
        }

        let node = doc.get_dictionary(node_id).map_err(malformed_tree)?;
        match node.get(b"Kids").and_then(Object::as_array) {
            Ok(kids) => stack.extend(kids.iter().filter_map(|kid| kid.as_reference().ok())),
            Err(_) => check_parent_chain(doc, node_id)?,
        }
    }

    Ok(())
}

fn check_parent_chain(doc: &lopdf::Document, page_id: ObjectId) -> Result<()> {
    let mut seen = HashSet::new();
    let mut current = page_id;

    while seen.insert(current) {
        let node = doc.get_dictionary(current).map_err(malformed_tree)?;
        match node.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent) => current = parent,
            Err(_) => return Ok(()),
        }
    }

    Err(cyclic_tree(current))
}

fn malformed_tree(e: lopdf::Error) -> ResumeMatcherError {
    ResumeMatcherError::PdfExtraction(format!("Malformed page tree: {}", e))
}

fn cyclic_tree(id: ObjectId) -> ResumeMatcherError {
    ResumeMatcherError::PdfExtraction(format!(
        "Page tree is cyclic at object {} {}",
        id.0, id.1
    ))
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        self.extract_with_method(bytes).map(|(text, _)| text)
    }
}

/// DOCX extraction: paragraph text from `word/document.xml`, one paragraph per line
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ResumeMatcherError::DocxExtraction(format!("Failed to open DOCX: {}", e)))?;

        let mut xml = Vec::new();
        archive
            .by_name("word/document.xml")
            .map_err(|e| ResumeMatcherError::DocxExtraction(format!("Missing document body: {}", e)))?
            .read_to_end(&mut xml)?;

        Self::paragraphs(&xml).map(|paragraphs| paragraphs.join("\n"))
    }
}

impl DocxExtractor {
    fn paragraphs(xml: &[u8]) -> Result<Vec<String>> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut paragraphs = Vec::new();
        let mut current = String::new();
        let mut in_paragraph = false;
        let mut in_text = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                    b"p" => {
                        in_paragraph = true;
                        current.clear();
                    }
                    b"t" => in_text = true,
                    _ => {}
                },
                Ok(Event::Empty(ref e)) if in_paragraph => match e.local_name().as_ref() {
                    b"tab" => current.push('\t'),
                    b"br" | b"cr" => current.push('\n'),
                    _ => {}
                },
                Ok(Event::Text(ref e)) if in_text => {
                    let text = e.unescape().map_err(|err| {
                        ResumeMatcherError::DocxExtraction(format!("Bad text run: {}", err))
                    })?;
                    current.push_str(&text);
                }
                Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                    b"t" => in_text = false,
                    b"p" => {
                        in_paragraph = false;
                        paragraphs.push(std::mem::take(&mut current));
                    }
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(ResumeMatcherError::DocxExtraction(format!(
                        "Malformed document.xml at {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }

        Ok(paragraphs)
    }
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let markdown_content = String::from_utf8_lossy(bytes);

        let parser = Parser::new(&markdown_content);
        let mut html_output = String::new();
        html::push_html(&mut html_output, parser);

        Ok(self.html_to_text(&html_output))
    }
}

impl MarkdownExtractor {
    fn html_to_text(&self, html: &str) -> String {
        let text = html
            .replace("<br>", "\n")
            .replace("</p>", "\n\n")
            .replace("</li>", "\n");

        let mut stripped = String::with_capacity(text.len());
        let mut in_tag = false;
        for c in text.chars() {
            match c {
                '<' => in_tag = true,
                '>' if in_tag => in_tag = false,
                _ if !in_tag => stripped.push(c),
                _ => {}
            }
        }

        let decoded = stripped
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&");

        decoded
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Format dispatcher for resumes. Never returns an error: failures become
/// [`Extraction::Failed`] so the caller can score degraded input.
pub struct DocumentTextExtractor {
    pdf: PdfExtractor,
    docx: DocxExtractor,
}

impl DocumentTextExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        let ocr = config.ocr_enabled.then(|| OcrEngine::from_config(config));
        Self {
            pdf: PdfExtractor::new(ocr),
            docx: DocxExtractor,
        }
    }

    pub fn extract(&self, document: &Document) -> Extraction {
        let result = match document.format {
            DocumentFormat::Pdf => self.pdf.extract_with_method(&document.bytes),
            DocumentFormat::Docx => self
                .docx
                .extract(&document.bytes)
                .map(|text| (text, ExtractionMethod::Docx)),
        };

        match result {
            Ok((text, method)) => {
                let text = text.trim().to_string();
                info!("Extracted {} chars from {} via {:?}", text.len(), document.format, method);
                Extraction::Extracted { text, method }
            }
            Err(e) => {
                warn!("Text extraction failed for {} document: {}", document.format, e);
                Extraction::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Stream};
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Minimal DOCX container holding the given paragraphs
    pub(crate) fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
            .collect();
        let xml = format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
             <w:body>{}</w:body></w:document>",
            body
        );

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut cursor);
            zip.start_file("word/document.xml", SimpleFileOptions::default()).unwrap();
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        cursor.into_inner()
    }

    /// Ways to damage a generated PDF
    #[derive(Clone, Copy, PartialEq)]
    enum PdfFault {
        None,
        /// Every page's /Parent points at the page itself
        SelfParent,
        /// This page's /Contents is a plain dictionary instead of a stream
        BrokenContents(usize),
    }

    /// PDF with one Helvetica line per entry on each page
    fn build_pdf(pages: &[&[&str]], fault: PdfFault) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for (page_index, lines) in pages.iter().enumerate() {
            let mut operations = Vec::new();
            for (i, line) in lines.iter().enumerate() {
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                operations.push(Operation::new("Td", vec![72.into(), (720 - 20 * i as i64).into()]));
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("ET", vec![]));
            }
            let content_id = if fault == PdfFault::BrokenContents(page_index) {
                doc.add_object(dictionary! { "Length" => 0 })
            } else {
                let content = Content { operations }.encode().unwrap();
                doc.add_object(Stream::new(dictionary! {}, content))
            };

            let page_id = doc.new_object_id();
            let parent = if fault == PdfFault::SelfParent { page_id } else { pages_id };
            doc.objects.insert(
                page_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Page",
                    "Parent" => parent,
                    "Contents" => content_id,
                }),
            );
            kids.push(page_id.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => kids.len() as i64,
                "Kids" => kids,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn extractor_without_ocr() -> DocumentTextExtractor {
        let mut config = crate::config::Config::default().extraction;
        config.ocr_enabled = false;
        DocumentTextExtractor::new(&config)
    }

    #[test]
    fn test_pdf_text_layer_is_first_pass() {
        let bytes = build_pdf(&[&["Python developer, 5+ years of experience"]], PdfFault::None);

        let extraction = extractor_without_ocr().extract(&Document::new(bytes, DocumentFormat::Pdf));

        match extraction {
            Extraction::Extracted { text, method } => {
                assert_eq!(method, ExtractionMethod::TextLayer);
                assert!(text.contains("Python developer, 5+ years of experience"));
            }
            Extraction::Failed { reason } => panic!("extraction failed: {}", reason),
        }
    }

    #[test]
    fn test_textless_pdf_without_ocr_fails() {
        let bytes = build_pdf(&[&[]], PdfFault::None);

        assert!(PdfExtractor::without_ocr().extract_with_method(&bytes).is_err());

        let extraction = extractor_without_ocr().extract(&Document::new(bytes, DocumentFormat::Pdf));
        assert!(extraction.is_failed());
    }

    #[test]
    fn test_self_parented_page_is_rejected_before_layout_pass() {
        let bytes = build_pdf(&[&["Python developer"]], PdfFault::SelfParent);

        let extraction = extractor_without_ocr().extract(&Document::new(bytes, DocumentFormat::Pdf));

        match extraction {
            Extraction::Failed { reason } => assert!(reason.contains("cyclic"), "{}", reason),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_page_keeps_other_pages() {
        let bytes = build_pdf(
            &[&["Skills: Rust, Kafka"], &["lost page"], &["Since 2017 at Initech"]],
            PdfFault::BrokenContents(1),
        );

        let (text, method) = PdfExtractor::without_ocr().extract_with_method(&bytes).unwrap();

        assert_eq!(method, ExtractionMethod::TextLayer);
        assert!(text.contains("Skills: Rust, Kafka"));
        assert!(text.contains("Since 2017 at Initech"));
    }

    #[test]
    fn test_docx_paragraphs_in_order() {
        let bytes = build_docx(&["Jane Roe", "Skills: Python &amp; SQL", "5+ years of experience"]);
        let text = DocxExtractor.extract(&bytes).unwrap();

        assert_eq!(text, "Jane Roe\nSkills: Python & SQL\n5+ years of experience");
    }

    #[test]
    fn test_docx_split_runs_join_within_paragraph() {
        let xml = br#"<w:document xmlns:w="w"><w:body><w:p><w:r><w:t>Machine </w:t></w:r><w:r><w:t>learning</w:t></w:r><w:r><w:tab/><w:t>NLP</w:t></w:r></w:p></w:body></w:document>"#;
        let paragraphs = DocxExtractor::paragraphs(xml).unwrap();

        assert_eq!(paragraphs, vec!["Machine learning\tNLP".to_string()]);
    }

    #[test]
    fn test_corrupt_docx_degrades_to_failed_extraction() {
        let extractor = DocumentTextExtractor::new(&crate::config::Config::default().extraction);
        let doc = Document::new(b"definitely not a zip".to_vec(), DocumentFormat::Docx);

        let extraction = extractor.extract(&doc);
        assert!(extraction.is_failed());
        assert_eq!(extraction.text(), "");
        assert!(!extraction.status().succeeded);
    }

    #[test]
    fn test_corrupt_pdf_without_ocr_fails_as_value() {
        let mut config = crate::config::Config::default().extraction;
        config.ocr_enabled = false;
        let extractor = DocumentTextExtractor::new(&config);
        let doc = Document::new(b"%PDF-1.4 garbage".to_vec(), DocumentFormat::Pdf);

        let extraction = extractor.extract(&doc);
        assert!(extraction.is_failed());
        assert_eq!(extraction.into_text(), "");
    }

    #[test]
    fn test_markdown_is_stripped() {
        let text = MarkdownExtractor
            .extract(b"## Requirements\n\n- **Python** and SQL\n- 3+ years")
            .unwrap();

        assert!(text.contains("Requirements"));
        assert!(text.contains("Python and SQL"));
        assert!(!text.contains("**"));
        assert!(!text.contains("##"));
    }
}
