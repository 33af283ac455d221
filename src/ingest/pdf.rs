//! PDF text extraction

use std::path::Path;

use crate::types::IngestError;

/// Text content of a single PDF page
#[derive(Debug, Clone)]
pub struct PageText {
    /// 1-based page number
    pub number: u32,
    pub text: String,
}

/// Extract per-page text from a PDF file.
///
/// Pages whose content streams fail to decode are logged and skipped, as
/// are pages with no extractable text. A file that cannot be opened is
/// `IngestError::PdfRead`; a document yielding no text at all is
/// `IngestError::EmptyDocument`.
pub fn extract_pages(path: &Path) -> Result<Vec<PageText>, IngestError> {
    let document = lopdf::Document::load(path).map_err(|e| IngestError::PdfRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut pages = Vec::new();

    for (number, _object_id) in document.get_pages() {
        match document.extract_text(&[number]) {
            Ok(text) => {
                if text.trim().is_empty() {
                    tracing::debug!(page = number, "Page has no extractable text, skipping");
                    continue;
                }
                pages.push(PageText { number, text });
            }
            Err(e) => {
                tracing::warn!(page = number, error = %e, "Failed to extract page text, skipping");
            }
        }
    }

    if pages.is_empty() {
        return Err(IngestError::EmptyDocument {
            path: path.display().to_string(),
        });
    }

    tracing::debug!(
        path = %path.display(),
        pages = pages.len(),
        "Extracted text from PDF"
    );

    Ok(pages)
}
