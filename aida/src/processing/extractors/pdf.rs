use super::ExtractedContent;
use crate::error::{AidaError, Result};
use crate::models::FileType;

pub struct PdfExtractor;

impl PdfExtractor {
    /// Page texts joined by newlines in page order.
    ///
    /// Scanned PDFs come back with little or no text; that is not an error here.
    pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ExtractedContent {
                text: String::new(),
                page_count: 1,
                file_type: FileType::Pdf,
            });
        }

        let pages = pdf_extract::extract_text_from_mem_by_pages(bytes)
            .map_err(|e| AidaError::Processing(format!("PDF extraction failed: {e}")))?;

        let text = pages
            .iter()
            .map(|page| page.trim_end())
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string();

        Ok(ExtractedContent {
            text,
            page_count: pages.len().max(1) as u32,
            file_type: FileType::Pdf,
        })
    }
}
