//! Provider trait — the abstraction over text-completion backends.
//!
//! The assistant only ever needs "prompt in, text out". Each call is a
//! single attempt; retries are not part of the contract.
//!
//! Implementations: Gemini, OpenAI-compatible endpoints.

use async_trait::async_trait;

use crate::error::ProviderError;

/// The core Provider trait.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "openai").
    fn name(&self) -> &str;

    /// The model identifier requests are sent to.
    fn model(&self) -> &str;

    /// Generate a completion for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}
