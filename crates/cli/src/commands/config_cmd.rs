//! `companion config` — Configuration helpers.

use std::path::PathBuf;

use companion_config::AppConfig;

pub fn default() {
    print!("{}", AppConfig::default_toml());
}

pub fn show(config_path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config =
        crate::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", effective_toml(&config)?);
    Ok(())
}

/// The effective configuration with every secret removed.
fn effective_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut redacted = config.clone();
    redacted.auth.jwt_secret = None;
    redacted.provider.api_key = None;
    redacted.cache.password = None;
    // Connection strings routinely embed credentials
    redacted.cache.url = redacted.cache.url.map(|_| "[REDACTED]".into());
    redacted.store.url = redacted.store.url.map(|_| "[REDACTED]".into());
    toml::to_string_pretty(&redacted)
}

pub fn path(config_path: Option<&PathBuf>) {
    let path = config_path
        .cloned()
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    println!("{}", path.display());
}

pub fn validate(config_path: Option<&PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Validating configuration...");

    let config = match crate::load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    };
    println!("   ✅ Config parsed successfully");

    let missing = config.missing_for_serve();
    if missing.is_empty() {
        println!("   ✅ Ready to serve");
    } else {
        for m in &missing {
            println!("   ⚠️  Missing {m}");
        }
    }

    println!();
    println!("   Gateway:   {}:{}", config.gateway.host, config.gateway.port);
    println!("   Cache:     {}", config.cache.backend);
    println!("   Store:     {}", config.store.backend);
    println!("   Provider:  {} ({})", config.provider.kind, config.provider.model);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_config_omits_secrets() {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = Some("jwt-secret-value".into());
        config.provider.api_key = Some("gemini-key-value".into());
        config.cache.backend = "redis".into();
        config.cache.url = Some("redis://:pw@cache.internal:6379".into());
        config.store.url = Some("postgres://user:pw@db/companion".into());

        let rendered = effective_toml(&config).unwrap();
        assert!(!rendered.contains("jwt-secret-value"));
        assert!(!rendered.contains("gemini-key-value"));
        assert!(!rendered.contains("cache.internal"));
        assert!(!rendered.contains("user:pw"));
        assert!(rendered.contains("backend = \"redis\""));
    }

    #[test]
    fn default_config_path_is_under_config_dir() {
        let path = AppConfig::config_dir().join("config.toml");
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }
}
