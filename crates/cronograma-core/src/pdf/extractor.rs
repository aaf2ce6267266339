//! PDF page text extraction using lopdf and pdf-extract.

use lopdf::Document;
use tracing::{debug, trace, warn};

use super::{PageSource, RawDocument, Result};
use crate::error::PdfError;
use crate::models::config::PdfConfig;

/// PDF page text extractor using lopdf.
pub struct PdfExtractor {
    document: Option<Document>,
    raw_data: Vec<u8>,
    config: PdfConfig,
}

impl PdfExtractor {
    /// Create a new PDF extractor.
    pub fn new() -> Self {
        Self::with_config(PdfConfig::default())
    }

    /// Create an extractor with explicit settings.
    pub fn with_config(config: PdfConfig) -> Self {
        Self {
            document: None,
            raw_data: Vec::new(),
            config,
        }
    }

    /// Load a PDF from bytes.
    pub fn load(&mut self, data: &[u8]) -> Result<()> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        // Handle PDFs with empty password encryption
        if doc.is_encrypted() {
            if !self.config.decrypt_empty_password || doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes
            let mut decrypted_data = Vec::new();
            doc.save_to(&mut decrypted_data)
                .map_err(|e| PdfError::Parse(format!("Failed to save decrypted PDF: {}", e)))?;
            self.raw_data = decrypted_data;
        } else {
            self.raw_data = data.to_vec();
        }

        let page_count = doc.get_pages().len();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        debug!("Loaded PDF with {} pages", page_count);
        self.document = Some(doc);
        Ok(())
    }

    /// Load a PDF from a file path.
    pub fn open(path: &std::path::Path, config: PdfConfig) -> crate::Result<Self> {
        let data = std::fs::read(path)?;
        let mut extractor = Self::with_config(config);
        extractor.load(&data)?;
        Ok(extractor)
    }

    /// Get the number of pages in the PDF.
    pub fn page_count(&self) -> u32 {
        self.document
            .as_ref()
            .map(|doc| doc.get_pages().len() as u32)
            .unwrap_or(0)
    }

    /// Extract text from a specific page (1-indexed).
    pub fn extract_page_text(&self, page: u32) -> Result<String> {
        let doc = self
            .document
            .as_ref()
            .ok_or_else(|| PdfError::Parse("No document loaded".to_string()))?;

        if page == 0 || page > self.page_count() {
            return Err(PdfError::InvalidPage(page));
        }

        doc.extract_text(&[page])
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }

    /// Per-page text via pdf-extract.
    fn extract_pages_fallback(&self) -> Result<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(&self.raw_data)
            .map_err(|e| PdfError::TextExtraction(e.to_string()))
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageSource for PdfExtractor {
    fn pages(&self) -> Result<RawDocument> {
        let page_count = self.page_count();
        if page_count == 0 {
            return Err(PdfError::NoPages);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            match self.extract_page_text(page) {
                Ok(text) if !text.trim().is_empty() => {
                    trace!("Page {}: {} chars", page, text.len());
                    pages.push(Some(text));
                }
                Ok(_) => pages.push(None),
                Err(e) => {
                    warn!("Failed to extract text from page {}: {}", page, e);
                    pages.push(None);
                }
            }
        }

        let document = RawDocument::new(pages);
        if document.is_blank() && self.config.text_fallback {
            debug!("lopdf found no text, trying pdf-extract");
            match self.extract_pages_fallback() {
                Ok(texts) => return Ok(RawDocument::from_texts(texts)),
                Err(e) => warn!("pdf-extract fallback failed: {}", e),
            }
        }

        Ok(document)
    }

    fn backend_name(&self) -> &str {
        "lopdf"
    }
}
