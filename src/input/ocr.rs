//! OCR fallback for scanned PDFs
//!
//! Pages are rendered with `pdftoppm`, binarized in-process, and recognized with
//! `tesseract`. Every hop is piped through stdin/stdout, nothing touches disk.

use crate::config::ExtractionConfig;
use crate::error::{Result, ResumeMatcherError};
use image::{DynamicImage, ImageFormat};
use imageproc::contrast::adaptive_threshold;
use log::{debug, info, warn};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};
use std::thread;

#[derive(Debug, Clone)]
pub struct OcrEngine {
    dpi: u32,
    language: String,
    page_segmentation: u32,
    block_radius: u32,
}

impl OcrEngine {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            dpi: config.ocr_dpi,
            language: config.ocr_language.clone(),
            page_segmentation: config.ocr_page_segmentation,
            block_radius: config.threshold_block_radius.max(1),
        }
    }

    /// Check whether `pdftoppm` and `tesseract` are on the PATH
    pub fn is_available() -> bool {
        let pdftoppm = Command::new("pdftoppm").arg("-v").output().is_ok();
        let tesseract = Command::new("tesseract").arg("--version").output().is_ok();

        if !pdftoppm {
            debug!("pdftoppm not found - install poppler-utils for OCR support");
        }
        if !tesseract {
            debug!("tesseract not found - install tesseract-ocr for OCR support");
        }

        pdftoppm && tesseract
    }

    /// OCR every page of `pdf` and join the page texts with newlines
    pub fn extract(&self, pdf: &[u8], page_count: usize) -> Result<String> {
        if page_count == 0 {
            return Err(ResumeMatcherError::Ocr("document has no pages".to_string()));
        }

        info!("Starting OCR on {} pages (dpi={}, lang={})", page_count, self.dpi, self.language);

        let mut pages = Vec::with_capacity(page_count);
        for page in 1..=page_count {
            let rendered = self.render_page(pdf, page)?;
            let binarized = binarize(&rendered, self.block_radius)?;

            match self.recognize(&binarized) {
                Ok(text) => pages.push(text),
                Err(e) => warn!("OCR failed on page {}: {}", page, e),
            }
        }

        let text = pages.join("\n");
        info!("OCR complete: {} chars extracted", text.len());
        Ok(text)
    }

    fn render_page(&self, pdf: &[u8], page: usize) -> Result<Vec<u8>> {
        let page = page.to_string();
        let dpi = self.dpi.to_string();
        run_piped(
            "pdftoppm",
            &["-f", &page, "-l", &page, "-r", &dpi, "-png", "-singlefile", "-"],
            pdf,
        )
    }

    fn recognize(&self, png: &[u8]) -> Result<String> {
        let psm = self.page_segmentation.to_string();
        let stdout = run_piped(
            "tesseract",
            &["stdin", "stdout", "-l", &self.language, "--psm", &psm],
            png,
        )?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// Grayscale + adaptive threshold, re-encoded as PNG
pub fn binarize(png: &[u8], block_radius: u32) -> Result<Vec<u8>> {
    let gray = image::load_from_memory(png)
        .map_err(|e| ResumeMatcherError::Ocr(format!("Failed to decode rendered page: {}", e)))?
        .to_luma8();

    let binary = adaptive_threshold(&gray, block_radius);

    let mut encoded = Vec::new();
    DynamicImage::ImageLuma8(binary)
        .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
        .map_err(|e| ResumeMatcherError::Ocr(format!("Failed to encode binarized page: {}", e)))?;

    Ok(encoded)
}

/// Run `program`, feed `input` on stdin and collect stdout
fn run_piped(program: &str, args: &[&str], input: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ResumeMatcherError::Ocr(format!("Failed to run {}: {}", program, e)))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| ResumeMatcherError::Ocr(format!("{} stdin unavailable", program)))?;

    // stdin is fed from its own thread while stdout drains
    let payload = input.to_vec();
    let writer = thread::spawn(move || stdin.write_all(&payload));

    let output = child
        .wait_with_output()
        .map_err(|e| ResumeMatcherError::Ocr(format!("{} did not finish: {}", program, e)))?;

    match writer.join() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => debug!("{} closed stdin early: {}", program, e),
        Err(_) => return Err(ResumeMatcherError::Ocr(format!("{} writer thread panicked", program))),
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ResumeMatcherError::Ocr(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn encode(img: GrayImage) -> Vec<u8> {
        let mut buf = Vec::new();
        DynamicImage::ImageLuma8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_binarize_produces_pure_black_and_white() {
        // Gradient background with a dark stroke through the middle
        let img = GrayImage::from_fn(40, 20, |x, y| {
            if y == 10 {
                Luma([10u8])
            } else {
                Luma([(120 + x * 3) as u8])
            }
        });

        let out = binarize(&encode(img), 5).unwrap();
        let decoded = image::load_from_memory(&out).unwrap().to_luma8();

        assert_eq!(decoded.dimensions(), (40, 20));
        assert!(decoded.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(decoded.get_pixel(20, 10)[0], 0);
    }

    #[test]
    fn test_binarize_rejects_garbage() {
        assert!(binarize(b"not a png", 5).is_err());
    }

    #[test]
    fn test_zero_pages_is_an_error() {
        let engine = OcrEngine::from_config(&crate::config::Config::default().extraction);
        assert!(engine.extract(b"%PDF-1.4", 0).is_err());
    }
}
