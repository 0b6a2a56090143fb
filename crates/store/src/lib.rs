//! Durable context stores for Project Companion.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use in_memory::InMemoryStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use companion_config::StoreConfig;
use companion_core::error::StoreError;
use companion_core::store::ContextStore;
use tracing::{info, warn};

/// Run one store operation, failing with [`StoreError::Timeout`] if it does
/// not finish within `limit`.
///
/// The pool's acquire timeout only covers checking out a connection; this
/// covers the query itself (row locks, half-open sockets).
pub(crate) async fn bounded<T, F>(limit: Duration, op: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    tokio::time::timeout(limit, op)
        .await
        .map_err(|_| StoreError::Timeout {
            timeout_secs: limit.as_secs(),
        })?
}

/// Open the store backend named in configuration.
///
/// Unlike the cache, the store is authoritative: failing to open it is a
/// startup error.
pub async fn build_from_config(config: &StoreConfig) -> Result<Arc<dyn ContextStore>, StoreError> {
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.backend.as_str() {
        "memory" => {
            warn!("Using in-memory context store; extracted text is lost on restart");
            Ok(Arc::new(InMemoryStore::new()))
        }
        #[cfg(feature = "postgres")]
        "postgres" => {
            let url = config
                .url
                .as_deref()
                .ok_or_else(|| StoreError::Storage("store.url is required for postgres".into()))?;
            let store = PostgresStore::connect(url, config.max_connections, timeout).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "sqlite")]
        "sqlite" => {
            let path = match &config.url {
                Some(url) => url.clone(),
                None => {
                    let path = companion_config::AppConfig::default_sqlite_path();
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent).map_err(|e| {
                            StoreError::Storage(format!("Cannot create {}: {e}", parent.display()))
                        })?;
                    }
                    format!("sqlite://{}", path.display())
                }
            };
            let store = SqliteStore::new(&path, config.max_connections, timeout).await?;
            Ok(Arc::new(store))
        }
        other => {
            info!(backend = %other, "Unsupported store backend requested");
            Err(StoreError::Storage(format!(
                "store backend \"{other}\" is not available in this build"
            )))
        }
    }
}
