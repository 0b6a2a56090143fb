//! Context resolution: volatile cache, then durable store, then extraction.

use std::sync::Arc;
use std::time::Duration;

use companion_core::error::{ExtractError, StoreError};
use companion_core::store::ContextRecord;
use companion_core::{CacheKey, ContextStore, DocumentExtractor, PdfPayload, Project, VolatileCache};
use tracing::{debug, info, warn};

use crate::flight::KeyedLocks;

/// Returned when a project has no stored context and no extractable PDF.
/// Never cached or persisted.
pub const NO_CONTEXT: &str = "No project context available.";

const DEFAULT_TTL: Duration = Duration::from_secs(86_400);
const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves the textual context of a project.
///
/// The durable store is authoritative; the cache only ever holds copies of
/// text that has been (or is being) written to the store.
pub struct ContextResolver {
    cache: Arc<dyn VolatileCache>,
    store: Arc<dyn ContextStore>,
    extractor: Arc<dyn DocumentExtractor>,
    locks: KeyedLocks,
    ttl: Duration,
    extraction_timeout: Duration,
    store_timeout: Duration,
}

impl ContextResolver {
    pub fn new(
        cache: Arc<dyn VolatileCache>,
        store: Arc<dyn ContextStore>,
        extractor: Arc<dyn DocumentExtractor>,
        locks: KeyedLocks,
    ) -> Self {
        Self {
            cache,
            store,
            extractor,
            locks,
            ttl: DEFAULT_TTL,
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// Bound on each store read or write made while holding a key's lock.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    /// Return the project's document text, or [`NO_CONTEXT`].
    ///
    /// Never fails: cache and store problems degrade to misses, extraction
    /// problems to "no document".
    pub async fn resolve(&self, project_id: &str, project: &Project) -> String {
        let key = CacheKey::context(project_id);

        if let Some(text) = self.cached(&key).await {
            debug!(project_id = %project_id, "Context cache hit");
            return text;
        }

        let guard = self.locks.lock(&key).await;
        if guard.waited() {
            if let Some(text) = self.cached(&key).await {
                debug!(project_id = %project_id, "Context filled by concurrent request");
                return text;
            }
        }

        match self.read_store(project_id).await {
            Ok(Some(record)) if !record.pdf_text.trim().is_empty() => {
                debug!(project_id = %project_id, "Context store hit");
                self.fill_cache(&key, &record.pdf_text).await;
                return record.pdf_text;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "Context store read failed; treating as miss");
            }
        }

        let Some(text) = self.extract(project_id, project).await else {
            debug!(project_id = %project_id, "No extractable document");
            return NO_CONTEXT.to_string();
        };

        if let Err(e) = self.write_store(project_id, &text).await {
            warn!(project_id = %project_id, error = %e, "Failed to persist extracted context");
        }
        self.fill_cache(&key, &text).await;

        info!(project_id = %project_id, chars = text.chars().count(), "Extracted project context");
        text
    }

    async fn cached(&self, key: &str) -> Option<String> {
        match self.cache.get(key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache unavailable; treating as miss");
                None
            }
        }
    }

    async fn fill_cache(&self, key: &str, text: &str) {
        if let Err(e) = self.cache.set(key, text, self.ttl).await {
            warn!(key = %key, error = %e, "Cache unavailable; skipping write");
        }
    }

    async fn read_store(&self, project_id: &str) -> Result<Option<ContextRecord>, StoreError> {
        tokio::time::timeout(self.store_timeout, self.store.read(project_id))
            .await
            .map_err(|_| self.store_timed_out())?
    }

    async fn write_store(&self, project_id: &str, text: &str) -> Result<(), StoreError> {
        tokio::time::timeout(self.store_timeout, self.store.write(project_id, text))
            .await
            .map_err(|_| self.store_timed_out())?
    }

    fn store_timed_out(&self) -> StoreError {
        StoreError::Timeout {
            timeout_secs: self.store_timeout.as_secs(),
        }
    }

    /// Extract the embedded PDF's text; any failure means "no document".
    async fn extract(&self, project_id: &str, project: &Project) -> Option<String> {
        let pdf = project.pdf()?;

        match self.run_extractor(pdf).await {
            Ok(Some(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(e) => {
                warn!(project_id = %project_id, error = %e, "PDF extraction failed");
                None
            }
        }
    }

    /// Decode the payload and run the extractor on the blocking pool.
    async fn run_extractor(&self, pdf: &PdfPayload) -> Result<Option<String>, ExtractError> {
        let bytes = pdf.decode()?;
        let extractor = self.extractor.clone();
        let task = tokio::task::spawn_blocking(move || extractor.extract(&bytes));

        match tokio::time::timeout(self.extraction_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(ExtractError::Aborted(e.to_string())),
            Err(_) => Err(ExtractError::Timeout {
                timeout_secs: self.extraction_timeout.as_secs(),
            }),
        }
    }
}
