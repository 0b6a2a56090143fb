//! Error types for the Project Companion domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model returned no content: {0}")]
    EmptyResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("Cache connection failed: {0}")]
    Connection(String),

    #[error("Cache command failed: {0}")]
    Command(String),

    #[error("Cache operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Store operation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid base64 payload: {0}")]
    Decode(String),

    #[error("Malformed document: {0}")]
    Malformed(String),

    #[error("Extraction timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Extraction task aborted: {0}")]
    Aborted(String),
}

#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error("Failed to fetch projects ({status})")]
    Status { status: u16, body: String },

    #[error("Submission service unreachable: {0}")]
    Unreachable(String),

    #[error("Project not found: {0}")]
    NotFound(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl UpstreamError {
    /// The HTTP status this failure should be reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            UpstreamError::Status { status, .. } => *status,
            UpstreamError::Unreachable(_) => 503,
            UpstreamError::NotFound(_) => 404,
            UpstreamError::InvalidResponse(_) => 502,
        }
    }
}
