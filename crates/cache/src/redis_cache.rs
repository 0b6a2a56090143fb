//! Redis cache backend.
//!
//! Uses a deadpool-redis connection pool. Every command is bounded by the
//! configured timeout; pool exhaustion, connection loss and timeouts all
//! surface as [`CacheError`] for the caller to degrade.

use async_trait::async_trait;
use companion_config::CacheConfig;
use companion_core::cache::VolatileCache;
use companion_core::error::CacheError;
use deadpool_redis::{Pool, PoolConfig, Runtime, Timeouts};
use redis::{AsyncCommands, IntoConnectionInfo};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Redis-backed volatile cache.
pub struct RedisCache {
    pool: Pool,
    timeout: Duration,
}

impl RedisCache {
    /// Build a pool from configuration. Does not connect yet.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| CacheError::Connection("cache.url is not set".into()))?;

        let mut info = url
            .into_connection_info()
            .map_err(|e| CacheError::Connection(format!("Invalid Redis URL: {e}")))?;
        if let Some(password) = &config.password {
            info.redis.password = Some(password.clone());
        }

        let timeout = Duration::from_millis(config.timeout_ms);
        let mut pool_config = PoolConfig::new(config.pool_size);
        pool_config.timeouts = Timeouts {
            wait: Some(timeout),
            create: Some(timeout),
            recycle: Some(timeout),
        };

        let mut redis_config = deadpool_redis::Config::from_connection_info(info);
        redis_config.pool = Some(pool_config);

        let pool = redis_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| CacheError::Connection(format!("Failed to create Redis pool: {e}")))?;

        info!(pool_size = config.pool_size, timeout_ms = config.timeout_ms, "Redis cache pool created");
        Ok(Self { pool, timeout })
    }

    /// Run `op` under the command timeout.
    async fn bounded<T, F>(&self, op: F) -> Result<T, CacheError>
    where
        F: Future<Output = Result<T, CacheError>>,
    {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| CacheError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            })?
    }

    async fn connection(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool
            .get()
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))
    }
}

#[async_trait]
impl VolatileCache for RedisCache {
    fn name(&self) -> &str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let value: Option<String> = conn
                .get(key)
                .await
                .map_err(|e| CacheError::Command(format!("GET {key}: {e}")))?;
            debug!(key = %key, hit = value.is_some(), "redis GET");
            Ok(value)
        })
        .await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        // SET EX rejects a zero expiry
        let ttl_secs = ttl.as_secs().max(1);
        self.bounded(async {
            let mut conn = self.connection().await?;
            conn.set_ex::<_, _, ()>(key, value, ttl_secs)
                .await
                .map_err(|e| CacheError::Command(format!("SET {key}: {e}")))?;
            debug!(key = %key, ttl_secs, "redis SET");
            Ok(())
        })
        .await
    }

    async fn ping(&self) -> Result<(), CacheError> {
        self.bounded(async {
            let mut conn = self.connection().await?;
            let _: String = redis::cmd("PING")
                .query_async(&mut conn)
                .await
                .map_err(|e| CacheError::Command(format!("PING: {e}")))?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>) -> CacheConfig {
        CacheConfig {
            backend: "redis".into(),
            url: url.map(String::from),
            timeout_ms: 100,
            ..CacheConfig::default()
        }
    }

    #[test]
    fn missing_url_is_rejected() {
        let err = RedisCache::from_config(&config(None)).err().unwrap();
        assert!(matches!(err, CacheError::Connection(_)));
    }

    #[test]
    fn invalid_url_is_rejected() {
        assert!(RedisCache::from_config(&config(Some("not a url"))).is_err());
    }

    #[tokio::test]
    async fn unreachable_server_reports_error_instead_of_hanging() {
        // Port 1 on localhost refuses connections
        let cache = RedisCache::from_config(&config(Some("redis://127.0.0.1:1"))).unwrap();
        let result = cache.get("context:p1").await;
        assert!(result.is_err());
        assert!(cache.ping().await.is_err());
    }
}
