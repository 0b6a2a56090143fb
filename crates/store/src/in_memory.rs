//! In-memory context store — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::Utc;
use companion_core::error::StoreError;
use companion_core::store::{ContextRecord, ContextStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A context store backed by a HashMap.
/// Contents are lost when the process exits.
pub struct InMemoryStore {
    records: RwLock<HashMap<String, ContextRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryStore {
    fn name(&self) -> &str { "in_memory" }

    async fn read(&self, project_id: &str) -> Result<Option<ContextRecord>, StoreError> {
        Ok(self.records.read().await.get(project_id).cloned())
    }

    async fn write(&self, project_id: &str, pdf_text: &str) -> Result<(), StoreError> {
        let record = ContextRecord {
            project_id: project_id.to_string(),
            pdf_text: pdf_text.to_string(),
            updated_at: Utc::now(),
        };
        self.records
            .write()
            .await
            .insert(project_id.to_string(), record);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.records.read().await.len())
    }
}
