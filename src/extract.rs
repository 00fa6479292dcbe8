//! PDF page-text extraction.
//!
//! The ingestion handler only depends on [`PageExtractor`]; the production
//! implementation parses the document with lopdf and pulls text page by page.

use lopdf::Document;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse PDF: {0}")]
    Parse(String),
    #[error("failed to extract text from page {page}: {reason}")]
    Page { page: u32, reason: String },
}

/// Text of one page, 1-based page number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// Pages that produced text, in page order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedText {
    pages: Vec<PageText>,
}

impl ExtractedText {
    /// Keeps only pages whose text is non-empty, ordered by page number.
    pub fn from_pages(pages: impl IntoIterator<Item = PageText>) -> Self {
        let mut pages: Vec<PageText> = pages.into_iter().filter(|p| !p.text.is_empty()).collect();
        pages.sort_by_key(|p| p.page);
        Self { pages }
    }

    /// Number of pages that contributed text.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page texts joined by a single space.
    pub fn combined(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

pub trait PageExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError>;
}

/// lopdf ends every text object with a line break. Only those trailing breaks
/// are removed; other whitespace is page content, so a page holding nothing
/// but spaces still counts as a text page.
pub fn strip_text_object_breaks(text: &str) -> &str {
    text.trim_end_matches(|c| c == '\n' || c == '\r')
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl PageExtractor for LopdfExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<ExtractedText, ExtractError> {
        let doc = Document::load_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))?;

        let mut pages = Vec::new();
        for page in doc.get_pages().keys().copied() {
            let text = doc
                .extract_text(&[page])
                .map_err(|e| ExtractError::Page {
                    page,
                    reason: e.to_string(),
                })?;
            let text = strip_text_object_breaks(&text).to_string();
            debug!(page, chars = text.chars().count(), "extracted page text");
            pages.push(PageText { page, text });
        }

        Ok(ExtractedText::from_pages(pages))
    }
}
