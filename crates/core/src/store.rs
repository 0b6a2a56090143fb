//! Context store trait — the durable, authoritative home of extracted
//! project text.
//!
//! One [`ContextRecord`] per project. Writes are upserts: the first write
//! inserts, later writes overwrite the text in place.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Extracted document text for one project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Upstream project id (unique)
    pub project_id: String,

    /// Plain text extracted from the project's PDF
    pub pdf_text: String,

    /// When the text was last written
    pub updated_at: DateTime<Utc>,
}

/// The core ContextStore trait.
///
/// Implementations: SQLite, PostgreSQL, in-memory (for testing).
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "postgres", "in_memory").
    fn name(&self) -> &str;

    /// Read the stored record for a project.
    async fn read(&self, project_id: &str) -> Result<Option<ContextRecord>, StoreError>;

    /// Insert the text for a project, or overwrite it if a record exists.
    async fn write(&self, project_id: &str, pdf_text: &str) -> Result<(), StoreError>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize, StoreError>;
}
