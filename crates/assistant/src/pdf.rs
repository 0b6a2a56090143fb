//! PDF text extraction backed by `pdf-extract`.

use companion_core::DocumentExtractor;
use companion_core::error::ExtractError;

/// Extracts the text layer of a PDF.
///
/// Scanned documents without a text layer yield `Ok(None)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentExtractor for PdfExtractor {
    fn name(&self) -> &str {
        "pdf"
    }

    fn extract(&self, bytes: &[u8]) -> Result<Option<String>, ExtractError> {
        if bytes.is_empty() {
            return Err(ExtractError::Malformed("empty document".into()));
        }

        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| ExtractError::Malformed(format!("Failed to extract PDF text: {e}")))?;

        // pdf-extract separates pages with form feeds
        let text = text.replace('\x0c', "\n");
        let text = text.trim();

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(text.to_string()))
        }
    }
}
