//! Configuration loading, validation, and management for Project Companion.
//!
//! Loads configuration from `~/.companion/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.companion/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// JWT validation settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Upstream submission service
    #[serde(default)]
    pub submissions: SubmissionsConfig,

    /// Text-completion provider
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Volatile cache backend
    #[serde(default)]
    pub cache: CacheConfig,

    /// Durable context store backend
    #[serde(default)]
    pub store: StoreConfig,

    /// Context/answer policy
    #[serde(default)]
    pub assistant: AssistantConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    /// Origins allowed by CORS. Empty = same-origin only.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
            allowed_origins: vec![],
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HS256 secret shared with the auth service. Required to serve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt_secret: Option<String>,

    /// Clock skew tolerated when checking `exp`
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,
}

fn default_leeway_secs() -> u64 {
    30
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            leeway_secs: default_leeway_secs(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &redact(&self.jwt_secret))
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionsConfig {
    /// Base URL of the submission service. Required to serve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_submissions_timeout")]
    pub timeout_secs: u64,
}

fn default_submissions_timeout() -> u64 {
    25
}

impl Default for SubmissionsConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_submissions_timeout(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// "gemini" or "openai"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// API key. Required to serve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override the provider's base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

fn default_provider_kind() -> String {
    "gemini".into()
}
fn default_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f32 {
    0.4
}
fn default_provider_timeout() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_key: None,
            api_url: None,
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// "redis", "memory" or "none"
    #[serde(default = "default_cache_backend")]
    pub backend: String,

    /// Redis connection URL. Required when backend = "redis".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Redis password / token, if not embedded in the URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_pool_size")]
    pub pool_size: usize,

    /// Bound on every cache round-trip
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_backend() -> String {
    "memory".into()
}
fn default_pool_size() -> usize {
    8
}
fn default_cache_timeout_ms() -> u64 {
    500
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            url: None,
            password: None,
            pool_size: default_pool_size(),
            timeout_ms: default_cache_timeout_ms(),
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("backend", &self.backend)
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("password", &redact(&self.password))
            .field("pool_size", &self.pool_size)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "sqlite", "postgres" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Database URL or SQLite path. Required for postgres.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Bound on acquiring a pooled connection and on each query
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_max_connections() -> u32 {
    5
}
fn default_store_timeout() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: None,
            max_connections: default_max_connections(),
            timeout_secs: default_store_timeout(),
        }
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("backend", &self.backend)
            .field("url", &self.url.as_ref().map(|_| "[REDACTED]"))
            .field("max_connections", &self.max_connections)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// TTL of `context:{project_id}` entries
    #[serde(default = "default_context_ttl")]
    pub context_ttl_secs: u64,

    /// TTL of `answer:{project_id}:{question}` entries
    #[serde(default = "default_answer_ttl")]
    pub answer_ttl_secs: u64,

    /// Characters of document text included in an answer prompt
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_secs: u64,

    /// Collapse concurrent identical misses into one computation
    #[serde(default = "default_true")]
    pub single_flight: bool,
}

fn default_context_ttl() -> u64 {
    86_400
}
fn default_answer_ttl() -> u64 {
    1_800
}
fn default_max_context_chars() -> usize {
    8_000
}
fn default_extraction_timeout() -> u64 {
    30
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            context_ttl_secs: default_context_ttl(),
            answer_ttl_secs: default_answer_ttl(),
            max_context_chars: default_max_context_chars(),
            extraction_timeout_secs: default_extraction_timeout(),
            single_flight: true,
        }
    }
}

impl AssistantConfig {
    pub fn context_ttl(&self) -> Duration {
        Duration::from_secs(self.context_ttl_secs)
    }

    pub fn answer_ttl(&self) -> Duration {
        Duration::from_secs(self.answer_ttl_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_secs(self.extraction_timeout_secs)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.companion/config.toml).
    ///
    /// Environment variables override file values:
    /// - `SUBMISSION_SERVICE_URL`
    /// - `JWT_SECRET`
    /// - `COMPANION_API_KEY` (highest priority), then `GEMINI_API_KEY`
    /// - `REDIS_URL`, `REDIS_TOKEN`
    /// - `DATABASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, then apply process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Secrets and URLs set in the environment win over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup("SUBMISSION_SERVICE_URL") {
            self.submissions.url = Some(url);
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(key) = lookup("COMPANION_API_KEY").or_else(|| lookup("GEMINI_API_KEY")) {
            self.provider.api_key = Some(key);
        }
        if let Some(url) = lookup("REDIS_URL") {
            self.cache.url = Some(url);
            if self.cache.backend == "memory" {
                self.cache.backend = "redis".into();
            }
        }
        if let Some(token) = lookup("REDIS_TOKEN") {
            self.cache.password = Some(token);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            if url.starts_with("postgres") {
                self.store.backend = "postgres".into();
            }
            self.store.url = Some(url);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".companion")
    }

    /// Default SQLite database location.
    pub fn default_sqlite_path() -> PathBuf {
        Self::config_dir().join("contexts.db")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.cache.backend.as_str() {
            "redis" if self.cache.url.is_none() => {
                return Err(ConfigError::ValidationError(
                    "cache.url is required when cache.backend = \"redis\"".into(),
                ));
            }
            "redis" | "memory" | "none" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown cache.backend \"{other}\" (expected redis, memory or none)"
                )));
            }
        }

        match self.store.backend.as_str() {
            "postgres" if self.store.url.is_none() => {
                return Err(ConfigError::ValidationError(
                    "store.url is required when store.backend = \"postgres\"".into(),
                ));
            }
            "sqlite" | "postgres" | "memory" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "unknown store.backend \"{other}\" (expected sqlite, postgres or memory)"
                )));
            }
        }

        if !matches!(self.provider.kind.as_str(), "gemini" | "openai") {
            return Err(ConfigError::ValidationError(format!(
                "unknown provider.kind \"{}\" (expected gemini or openai)",
                self.provider.kind
            )));
        }

        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.assistant.max_context_chars == 0 {
            return Err(ConfigError::ValidationError(
                "assistant.max_context_chars must be > 0".into(),
            ));
        }

        if self.assistant.context_ttl_secs == 0 || self.assistant.answer_ttl_secs == 0 {
            return Err(ConfigError::ValidationError(
                "assistant TTLs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Settings that must be present before the gateway can serve traffic.
    ///
    /// Returns the names of every missing setting.
    pub fn missing_for_serve(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.submissions.url.is_none() {
            missing.push("submissions.url (SUBMISSION_SERVICE_URL)");
        }
        if self.auth.jwt_secret.is_none() {
            missing.push("auth.jwt_secret (JWT_SECRET)");
        }
        if self.provider.api_key.is_none() {
            missing.push("provider.api_key (GEMINI_API_KEY)");
        }
        missing
    }

    /// Generate a default config TOML string (for the `config` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.provider.model, "gemini-2.5-flash");
        assert_eq!(config.assistant.context_ttl_secs, 86_400);
        assert_eq!(config.assistant.answer_ttl_secs, 1_800);
        assert_eq!(config.assistant.max_context_chars, 8_000);
        assert_eq!(config.submissions.timeout_secs, 25);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.cache.backend, config.cache.backend);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().store.backend, "sqlite");
    }

    #[test]
    fn parses_file_with_partial_sections() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[submissions]
url = "http://submissions:8080"

[cache]
backend = "redis"
url = "redis://cache:6379"
timeout_ms = 200

[assistant]
answer_ttl_secs = 600
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.submissions.url.as_deref(), Some("http://submissions:8080"));
        assert_eq!(config.cache.backend, "redis");
        assert_eq!(config.cache.timeout_ms, 200);
        assert_eq!(config.assistant.answer_ttl_secs, 600);
        assert_eq!(config.assistant.context_ttl_secs, 86_400);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gateway\nport = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("SUBMISSION_SERVICE_URL", "http://upstream"),
            ("JWT_SECRET", "s3cret"),
            ("GEMINI_API_KEY", "gem-key"),
            ("REDIS_URL", "rediss://cache.example:6379"),
            ("REDIS_TOKEN", "tok"),
            ("DATABASE_URL", "postgres://u:p@db/companion"),
        ]));

        assert_eq!(config.submissions.url.as_deref(), Some("http://upstream"));
        assert_eq!(config.auth.jwt_secret.as_deref(), Some("s3cret"));
        assert_eq!(config.provider.api_key.as_deref(), Some("gem-key"));
        assert_eq!(config.cache.backend, "redis");
        assert_eq!(config.cache.password.as_deref(), Some("tok"));
        assert_eq!(config.store.backend, "postgres");
        assert!(config.validate().is_ok());
        assert!(config.missing_for_serve().is_empty());
    }

    #[test]
    fn companion_api_key_wins_over_gemini_key() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("COMPANION_API_KEY", "primary"),
            ("GEMINI_API_KEY", "secondary"),
        ]));
        assert_eq!(config.provider.api_key.as_deref(), Some("primary"));
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[("JWT_SECRET", "  ")]));
        assert!(config.auth.jwt_secret.is_none());
    }

    #[test]
    fn redis_without_url_rejected() {
        let config = AppConfig {
            cache: CacheConfig {
                backend: "redis".into(),
                ..CacheConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_backends_rejected() {
        let mut config = AppConfig::default();
        config.store.backend = "mongo".into();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.provider.kind = "bard".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_context_budget_rejected() {
        let mut config = AppConfig::default();
        config.assistant.max_context_chars = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_for_serve_lists_required_settings() {
        let missing = AppConfig::default().missing_for_serve();
        assert_eq!(missing.len(), 3);
        assert!(missing.iter().any(|m| m.contains("JWT_SECRET")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("topsecret".into());
        config.provider.api_key = Some("key-123".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("topsecret"));
        assert!(!debug.contains("key-123"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("gemini-2.5-flash"));
        assert!(toml_str.contains("[assistant]"));
    }
}
