//! Volatile cache implementations for Project Companion.

pub mod in_memory;
pub mod noop;

#[cfg(feature = "redis")]
pub mod redis_cache;

pub use in_memory::InMemoryCache;
pub use noop::NoopCache;

#[cfg(feature = "redis")]
pub use redis_cache::RedisCache;

use std::sync::Arc;

use companion_config::CacheConfig;
use companion_core::cache::VolatileCache;
use tracing::{info, warn};

/// Build the cache backend named in configuration.
///
/// The cache is an accelerator, so a Redis server that cannot be reached at
/// startup degrades to the in-process backend instead of aborting.
pub async fn build_from_config(config: &CacheConfig) -> Arc<dyn VolatileCache> {
    match config.backend.as_str() {
        "none" => {
            info!("Volatile cache disabled");
            Arc::new(NoopCache)
        }
        #[cfg(feature = "redis")]
        "redis" => match RedisCache::from_config(config) {
            Ok(cache) => {
                if let Err(e) = cache.ping().await {
                    warn!(error = %e, "Redis not reachable yet; operations will degrade to misses until it is");
                } else {
                    info!("Connected to Redis cache");
                }
                Arc::new(cache)
            }
            Err(e) => {
                warn!(error = %e, "Failed to configure Redis. Falling back to in-memory cache.");
                Arc::new(InMemoryCache::new())
            }
        },
        _ => {
            info!("Using in-memory volatile cache");
            Arc::new(InMemoryCache::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn builds_named_backends() {
        let none = build_from_config(&CacheConfig {
            backend: "none".into(),
            ..CacheConfig::default()
        })
        .await;
        assert_eq!(none.name(), "none");

        let memory = build_from_config(&CacheConfig::default()).await;
        assert_eq!(memory.name(), "in_memory");
    }

    #[tokio::test]
    async fn invalid_redis_config_falls_back_to_memory() {
        let cache = build_from_config(&CacheConfig {
            backend: "redis".into(),
            url: None,
            ..CacheConfig::default()
        })
        .await;
        assert_eq!(cache.name(), "in_memory");
    }
}
