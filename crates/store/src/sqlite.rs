//! SQLite context store.
//!
//! A single table, `project_contexts`, keyed by project id. Writes use
//! `INSERT .. ON CONFLICT DO UPDATE` so there is never more than one row per
//! project.

use async_trait::async_trait;
use chrono::Utc;
use companion_core::error::StoreError;
use companion_core::store::{ContextRecord, ContextStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::bounded;

const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// A production SQLite context store.
pub struct SqliteStore {
    pool: SqlitePool,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The table is created automatically. Pass `"sqlite::memory:"` for an
    /// in-process ephemeral database (useful for tests). `timeout` bounds both
    /// connection checkout and each query.
    pub async fn new(path: &str, max_connections: u32, timeout: Duration) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        // Every connection to :memory: is a separate database
        let max_connections = if path.contains(":memory:") { 1 } else { max_connections };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(timeout)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self {
            pool,
            query_timeout: timeout,
        };
        store.run_migrations().await?;
        info!("SQLite context store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self {
            pool,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_contexts (
                project_id  TEXT PRIMARY KEY NOT NULL,
                pdf_text    TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::MigrationFailed(format!("project_contexts table: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<ContextRecord, StoreError> {
        let project_id: String = row
            .try_get("project_id")
            .map_err(|e| StoreError::QueryFailed(format!("project_id column: {e}")))?;
        let pdf_text: String = row
            .try_get("pdf_text")
            .map_err(|e| StoreError::QueryFailed(format!("pdf_text column: {e}")))?;
        let updated_at_str: String = row
            .try_get("updated_at")
            .map_err(|e| StoreError::QueryFailed(format!("updated_at column: {e}")))?;

        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(ContextRecord {
            project_id,
            pdf_text,
            updated_at,
        })
    }
}

#[async_trait]
impl ContextStore for SqliteStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn read(&self, project_id: &str) -> Result<Option<ContextRecord>, StoreError> {
        let query = sqlx::query(
            "SELECT project_id, pdf_text, updated_at FROM project_contexts WHERE project_id = ?1",
        )
        .bind(project_id)
        .fetch_optional(&self.pool);

        let row = bounded(self.query_timeout, async {
            query
                .await
                .map_err(|e| StoreError::QueryFailed(format!("SELECT failed: {e}")))
        })
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn write(&self, project_id: &str, pdf_text: &str) -> Result<(), StoreError> {
        let upsert = sqlx::query(
            r#"
            INSERT INTO project_contexts (project_id, pdf_text, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(project_id) DO UPDATE SET
                pdf_text = excluded.pdf_text,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(project_id)
        .bind(pdf_text)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool);

        bounded(self.query_timeout, async {
            upsert
                .await
                .map_err(|e| StoreError::Storage(format!("UPSERT failed: {e}")))
        })
        .await?;

        debug!(project_id = %project_id, chars = pdf_text.len(), "Stored project context");
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let query = sqlx::query("SELECT COUNT(*) AS n FROM project_contexts").fetch_one(&self.pool);
        let row = bounded(self.query_timeout, async {
            query
                .await
                .map_err(|e| StoreError::QueryFailed(format!("COUNT failed: {e}")))
        })
        .await?;
        let n: i64 = row
            .try_get("n")
            .map_err(|e| StoreError::QueryFailed(format!("count column: {e}")))?;
        Ok(n as usize)
    }
}
