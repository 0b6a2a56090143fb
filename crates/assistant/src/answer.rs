//! Cached question answering over project context.

use std::sync::Arc;
use std::time::Duration;

use companion_core::{CacheKey, CachedAnswer, Project, Provider, VolatileCache};
use tracing::{debug, error, info, warn};

use crate::flight::KeyedLocks;
use crate::prompt::{answer_prompt, truncate_chars};
use crate::resolver::ContextResolver;

const DEFAULT_TTL: Duration = Duration::from_secs(1_800);
const DEFAULT_MAX_CONTEXT_CHARS: usize = 8_000;

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOrigin {
    Cached,
    Generated,
    /// The provider failed; the text is an `[AI Error] ...` message
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    pub origin: AnswerOrigin,
}

impl Answer {
    pub fn is_error(&self) -> bool {
        self.origin == AnswerOrigin::Failed
    }
}

pub struct AnswerService {
    resolver: Arc<ContextResolver>,
    cache: Arc<dyn VolatileCache>,
    provider: Arc<dyn Provider>,
    locks: KeyedLocks,
    ttl: Duration,
    max_context_chars: usize,
}

impl AnswerService {
    pub fn new(
        resolver: Arc<ContextResolver>,
        cache: Arc<dyn VolatileCache>,
        provider: Arc<dyn Provider>,
        locks: KeyedLocks,
    ) -> Self {
        Self {
            resolver,
            cache,
            provider,
            locks,
            ttl: DEFAULT_TTL,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_context_chars(mut self, max_chars: usize) -> Self {
        self.max_context_chars = max_chars;
        self
    }

    /// Answer `question` about a project, from cache when possible.
    ///
    /// Provider failures are reported in-band as an `[AI Error] ...` answer
    /// and are never cached.
    pub async fn answer(&self, project_id: &str, project: &Project, question: &str) -> Answer {
        let key = CacheKey::answer(project_id, question);

        if let Some(hit) = self.cached(&key).await {
            debug!(key = %key, "Answer cache hit");
            return Answer {
                text: hit.answer,
                origin: AnswerOrigin::Cached,
            };
        }

        let guard = self.locks.lock(&key).await;
        if guard.waited() {
            if let Some(hit) = self.cached(&key).await {
                debug!(key = %key, "Answer filled by concurrent request");
                return Answer {
                    text: hit.answer,
                    origin: AnswerOrigin::Cached,
                };
            }
        }

        let context = self.resolver.resolve(project_id, project).await;
        let excerpt = truncate_chars(&context, self.max_context_chars);
        let prompt = answer_prompt(project, excerpt, question);

        match self.provider.generate(&prompt).await {
            Ok(text) => {
                let text = text.trim().to_string();
                self.store_answer(&key, question, &text).await;
                info!(
                    project_id = %project_id,
                    provider = self.provider.name(),
                    "Generated answer"
                );
                Answer {
                    text,
                    origin: AnswerOrigin::Generated,
                }
            }
            Err(e) => {
                error!(project_id = %project_id, error = %e, "Answer generation failed");
                Answer {
                    text: format!("[AI Error] {e}"),
                    origin: AnswerOrigin::Failed,
                }
            }
        }
    }

    async fn cached(&self, key: &str) -> Option<CachedAnswer> {
        let raw = match self.cache.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache unavailable; treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(e) => {
                warn!(key = %key, error = %e, "Discarding undecodable cached answer");
                None
            }
        }
    }

    async fn store_answer(&self, key: &str, question: &str, text: &str) {
        let value = match serde_json::to_string(&CachedAnswer::new(question, text)) {
            Ok(value) => value,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize answer");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &value, self.ttl).await {
            warn!(key = %key, error = %e, "Cache unavailable; answer not cached");
        }
    }
}
