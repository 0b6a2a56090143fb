//! No-op cache backend — disables the hot tier entirely.

use async_trait::async_trait;
use companion_core::cache::VolatileCache;
use companion_core::error::CacheError;
use std::time::Duration;

/// A cache that stores nothing; every read is a miss.
pub struct NoopCache;

#[async_trait]
impl VolatileCache for NoopCache {
    fn name(&self) -> &str { "none" }

    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }
}
