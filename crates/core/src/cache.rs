//! Volatile cache trait — the hot tier in front of the context store and
//! the completion provider.
//!
//! The cache is strictly an accelerator. Backends report connectivity
//! problems as [`CacheError`]; callers in the assistant degrade them to a
//! miss (reads) or a skipped write, never to a request failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::CacheError;

/// A string key/value store with per-key expiry.
///
/// Implementations: Redis, in-memory (for testing and single-node setups),
/// none (no-op).
#[async_trait]
pub trait VolatileCache: Send + Sync {
    /// The backend name (e.g., "redis", "in_memory", "none").
    fn name(&self) -> &str;

    /// Fetch a live value. Expired keys are reported as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value, replacing any previous one, expiring after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Round-trip check used by health probes.
    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Builders for the two key families this service owns.
pub struct CacheKey;

impl CacheKey {
    /// `context:{project_id}`
    pub fn context(project_id: &str) -> String {
        format!("context:{project_id}")
    }

    /// `answer:{project_id}:{normalized_question}`
    pub fn answer(project_id: &str, question: &str) -> String {
        format!("answer:{project_id}:{}", normalize_question(question))
    }
}

/// Trim and lowercase a question so cosmetic variants share one cache entry.
pub fn normalize_question(question: &str) -> String {
    question.trim().to_lowercase()
}

/// The value stored under an `answer:` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedAnswer {
    /// The normalized question this answer was generated for
    pub question: String,

    /// The model's answer text
    pub answer: String,

    /// When the answer was generated
    pub generated_at: DateTime<Utc>,
}

impl CachedAnswer {
    pub fn new(question: &str, answer: impl Into<String>) -> Self {
        Self {
            question: normalize_question(question),
            answer: answer.into(),
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_key_format() {
        assert_eq!(CacheKey::context("p-7"), "context:p-7");
    }

    #[test]
    fn answer_keys_collide_for_cosmetic_variants() {
        let a = CacheKey::answer("p-7", "What is X?");
        let b = CacheKey::answer("p-7", "  what is x?  ");
        assert_eq!(a, b);
        assert_eq!(a, "answer:p-7:what is x?");
    }

    #[test]
    fn answer_keys_differ_per_project() {
        assert_ne!(CacheKey::answer("a", "q"), CacheKey::answer("b", "q"));
    }

    #[test]
    fn cached_answer_json_shape() {
        let cached = CachedAnswer::new(" Who Guides It? ", "Dr. Rao");
        let json = serde_json::to_value(&cached).unwrap();
        assert_eq!(json["question"], "who guides it?");
        assert_eq!(json["answer"], "Dr. Rao");
        assert!(json["generated_at"].is_string());
    }
}
