//! `companion serve` — Start the HTTP gateway.

use std::path::PathBuf;

pub async fn run(
    config_path: Option<&PathBuf>,
    port: Option<u16>,
    host: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config =
        crate::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;

    if let Some(port) = port {
        config.gateway.port = port;
    }
    if let Some(host) = host {
        config.gateway.host = host;
    }

    println!("Project Companion gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Cache:     {}", config.cache.backend);
    println!("   Store:     {}", config.store.backend);
    println!("   Provider:  {} ({})", config.provider.kind, config.provider.model);

    companion_gateway::start(config).await?;

    Ok(())
}
