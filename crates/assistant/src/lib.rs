//! The assistant core: project context resolution, cached question
//! answering and summaries.
//!
//! Two cached artifacts are managed here:
//!
//! 1. **Project context** (`context:{project_id}`): text extracted from the
//!    project's PDF. The volatile cache sits in front of the durable store,
//!    which is authoritative. Extraction only runs when both miss.
//! 2. **Answers** (`answer:{project_id}:{normalized_question}`): completed
//!    answers stored as [`CachedAnswer`](companion_core::CachedAnswer) JSON.
//!
//! Misses for the same key are collapsed by [`KeyedLocks`] so a burst of
//! identical questions costs one completion call.

pub mod answer;
pub mod flight;
pub mod pdf;
pub mod prompt;
pub mod resolver;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use answer::{Answer, AnswerOrigin, AnswerService};
pub use flight::{KeyGuard, KeyedLocks};
pub use pdf::PdfExtractor;
pub use resolver::{ContextResolver, NO_CONTEXT};
pub use summary::SummaryService;

use std::sync::Arc;

use companion_config::AssistantConfig;
use companion_core::{ContextStore, DocumentExtractor, Provider, VolatileCache};

/// The assembled assistant: one resolver shared by the answer service, plus
/// the summary service.
#[derive(Clone)]
pub struct Assistant {
    pub resolver: Arc<ContextResolver>,
    pub answers: Arc<AnswerService>,
    pub summaries: Arc<SummaryService>,
}

impl Assistant {
    pub fn new(
        cache: Arc<dyn VolatileCache>,
        store: Arc<dyn ContextStore>,
        provider: Arc<dyn Provider>,
        extractor: Arc<dyn DocumentExtractor>,
        config: &AssistantConfig,
    ) -> Self {
        let locks = KeyedLocks::new(config.single_flight);

        let resolver = Arc::new(
            ContextResolver::new(cache.clone(), store, extractor, locks.clone())
                .with_ttl(config.context_ttl())
                .with_extraction_timeout(config.extraction_timeout()),
        );

        let answers = Arc::new(
            AnswerService::new(resolver.clone(), cache, provider.clone(), locks)
                .with_ttl(config.answer_ttl())
                .with_max_context_chars(config.max_context_chars),
        );

        Self {
            resolver,
            answers,
            summaries: Arc::new(SummaryService::new(provider)),
        }
    }
}
