//! PDF page text module.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Ordered page texts of a document.
///
/// A page without text is `None`; callers treat it the same as an empty page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDocument {
    pages: Vec<Option<String>>,
}

impl RawDocument {
    pub fn new(pages: Vec<Option<String>>) -> Self {
        Self { pages }
    }

    /// Build a document from page strings, mapping blank pages to `None`.
    pub fn from_texts<I, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let pages = pages
            .into_iter()
            .map(Into::into)
            .map(|text: String| if text.trim().is_empty() { None } else { Some(text) })
            .collect();
        Self { pages }
    }

    pub fn pages(&self) -> &[Option<String>] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Iterate over pages with content, with their 1-based page numbers.
    pub fn text_pages(&self) -> impl Iterator<Item = (usize, &str)> {
        self.pages
            .iter()
            .enumerate()
            .filter_map(|(i, page)| page.as_deref().map(|text| (i + 1, text)))
            .filter(|(_, text)| !text.trim().is_empty())
    }

    /// All page texts joined by single spaces.
    pub fn full_text(&self) -> String {
        self.text_pages()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// True when no page has any text.
    pub fn is_blank(&self) -> bool {
        self.text_pages().next().is_none()
    }
}

/// Provider of page texts for a document.
pub trait PageSource {
    /// Ordered page texts.
    fn pages(&self) -> Result<RawDocument>;

    /// Name of the backend, for logs.
    fn backend_name(&self) -> &str {
        "unknown"
    }
}

impl PageSource for RawDocument {
    fn pages(&self) -> Result<RawDocument> {
        Ok(self.clone())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_texts_marks_blank_pages() {
        let doc = RawDocument::from_texts(["first", "  \n ", "third"]);
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.pages()[1], None);
        assert_eq!(doc.full_text(), "first third");
    }

    #[test]
    fn test_text_pages_numbers() {
        let doc = RawDocument::new(vec![None, Some("b".to_string()), Some(String::new())]);
        let pages: Vec<_> = doc.text_pages().collect();
        assert_eq!(pages, vec![(2, "b")]);
        assert!(!doc.is_blank());
        assert!(RawDocument::default().is_blank());
    }
}
