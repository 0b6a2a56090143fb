//! Scripted collaborators shared by the assistant tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use companion_core::error::{CacheError, ExtractError, ProviderError, StoreError};
use companion_core::store::ContextRecord;
use companion_core::{ContextStore, DocumentExtractor, PdfPayload, Project, Provider, VolatileCache};

/// Returns the same text for any document and counts invocations.
pub struct CountingExtractor {
    text: Option<String>,
    calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self {
            text: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DocumentExtractor for CountingExtractor {
    fn name(&self) -> &str {
        "counting"
    }

    fn extract(&self, _bytes: &[u8]) -> Result<Option<String>, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

/// Panics on every call, like a parser hitting a pathological document.
pub struct PanickingExtractor;

impl DocumentExtractor for PanickingExtractor {
    fn name(&self) -> &str {
        "panicking"
    }

    fn extract(&self, _bytes: &[u8]) -> Result<Option<String>, ExtractError> {
        panic!("parser bug");
    }
}

/// Blocks its thread for `delay` before returning text.
pub struct SlowExtractor {
    delay: Duration,
}

impl SlowExtractor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl DocumentExtractor for SlowExtractor {
    fn name(&self) -> &str {
        "slow"
    }

    fn extract(&self, _bytes: &[u8]) -> Result<Option<String>, ExtractError> {
        std::thread::sleep(self.delay);
        Ok(Some("too late".into()))
    }
}

/// A provider that answers from a script and records the prompts it saw.
pub struct ScriptedProvider {
    reply: Result<String, ProviderError>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn answering(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(ProviderError::Network(message.to_string())),
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Take `delay` (in tokio time) before replying.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.prompts.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-1"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone()
    }
}

/// A cache whose backend is permanently unreachable.
pub struct DownCache;

#[async_trait]
impl VolatileCache for DownCache {
    fn name(&self) -> &str {
        "down"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Connection("connection refused".into()))
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Connection("connection refused".into()))
    }
}

/// A store whose database is permanently unreachable.
pub struct DownStore;

#[async_trait]
impl ContextStore for DownStore {
    fn name(&self) -> &str {
        "down"
    }

    async fn read(&self, _project_id: &str) -> Result<Option<ContextRecord>, StoreError> {
        Err(StoreError::Storage("connection refused".into()))
    }

    async fn write(&self, _project_id: &str, _pdf_text: &str) -> Result<(), StoreError> {
        Err(StoreError::Storage("connection refused".into()))
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(StoreError::Storage("connection refused".into()))
    }
}

/// A store whose calls never complete, like a query stuck on a row lock.
pub struct StalledStore;

#[async_trait]
impl ContextStore for StalledStore {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn read(&self, _project_id: &str) -> Result<Option<ContextRecord>, StoreError> {
        std::future::pending().await
    }

    async fn write(&self, _project_id: &str, _pdf_text: &str) -> Result<(), StoreError> {
        std::future::pending().await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        std::future::pending().await
    }
}

pub fn project(id: &str) -> Project {
    Project {
        id: id.into(),
        title: Some("Crop Yield Prediction".into()),
        description: Some("ML on satellite imagery".into()),
        guide_name: Some("Dr. Rao".into()),
        students: vec!["Asha".into(), "Vikram".into()],
        ..Project::default()
    }
}

pub fn project_with_pdf(id: &str) -> Project {
    Project {
        project_summary_pdf: Some(PdfPayload {
            data: Some(STANDARD.encode(b"%PDF-1.4 fake document")),
            file_name: Some("summary.pdf".into()),
            ..PdfPayload::default()
        }),
        ..project(id)
    }
}
