//! Provider selection — builds the configured completion backend.

use std::sync::Arc;

use companion_config::ProviderConfig;
use companion_core::error::ProviderError;
use companion_core::provider::Provider;
use tracing::info;

use crate::gemini::GeminiProvider;
use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider named by `config.kind`.
///
/// A missing API key is a configuration error: the gateway refuses to start
/// rather than failing every request later.
pub fn build_from_config(config: &ProviderConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| ProviderError::NotConfigured(format!("{}: no API key", config.kind)))?;

    let provider: Arc<dyn Provider> = match config.kind.as_str() {
        "gemini" => {
            let mut p = GeminiProvider::new(api_key, &config.model, config.timeout_secs)?
                .with_temperature(config.temperature);
            if let Some(url) = &config.api_url {
                p = p.with_base_url(url);
            }
            Arc::new(p)
        }
        "openai" => {
            let base_url = config
                .api_url
                .clone()
                .unwrap_or_else(|| default_base_url("openai"));
            Arc::new(
                OpenAiCompatProvider::new("openai", base_url, api_key, &config.model, config.timeout_secs)?
                    .with_temperature(config.temperature),
            )
        }
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "unknown provider kind \"{other}\""
            )));
        }
    };

    info!(provider = provider.name(), model = provider.model(), "Completion provider ready");
    Ok(provider)
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openai" => "https://api.openai.com/v1".into(),
        "gemini" => "https://generativelanguage.googleapis.com/v1beta".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(kind: &str, key: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            kind: kind.into(),
            api_key: key.map(String::from),
            ..ProviderConfig::default()
        }
    }

    #[test]
    fn builds_gemini_by_default() {
        let provider = build_from_config(&config("gemini", Some("k"))).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.5-flash");
    }

    #[test]
    fn builds_openai() {
        let mut cfg = config("openai", Some("sk"));
        cfg.model = "gpt-4o-mini".into();
        let provider = build_from_config(&cfg).unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = build_from_config(&config("gemini", None)).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn unknown_kind_rejected() {
        assert!(build_from_config(&config("bard", Some("k"))).is_err());
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("gemini").contains("googleapis.com"));
    }
}
