//! Document extraction — turning raw PDF bytes into plain text.

use crate::error::ExtractError;

/// Extracts plain text from document bytes.
///
/// Extraction is CPU-bound and synchronous; callers run it on a blocking
/// thread. `Ok(None)` means the document parsed but contained no text.
pub trait DocumentExtractor: Send + Sync {
    /// The extractor name (e.g., "pdf").
    fn name(&self) -> &str;

    fn extract(&self, bytes: &[u8]) -> Result<Option<String>, ExtractError>;
}
