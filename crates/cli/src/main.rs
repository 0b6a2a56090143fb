//! Project Companion CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP gateway
//! - `doctor`  — Check configuration and backend connectivity
//! - `config`  — Print the default, effective or path of the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use companion_config::{AppConfig, ConfigError};

mod commands;

#[derive(Parser)]
#[command(
    name = "companion",
    about = "Project Companion — AI answers and summaries for academic project portals",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.companion/config.toml)
    #[arg(short, long, global = true, env = "COMPANION_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,

        /// Override the bind address
        #[arg(long)]
        host: Option<String>,
    },

    /// Check configuration and backend connectivity
    Doctor,

    /// Configuration helpers (prints the default config when no action is given)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the default configuration as TOML
    Default,
    /// Print the effective configuration (file + environment, secrets omitted)
    Show,
    /// Print the config file path
    Path,
    /// Validate the configuration
    Validate,
}

/// Load from `--config` if given, else the default location. Environment
/// overrides apply either way.
pub(crate) fn load_config(path: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => AppConfig::load_with_env(path),
        None => AppConfig::load(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(config_path, port, host).await?,
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Default) {
            ConfigAction::Default => commands::config_cmd::default(),
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path),
            ConfigAction::Validate => commands::config_cmd::validate(config_path)?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_serve_with_overrides() {
        let cli = Cli::try_parse_from(["companion", "serve", "--port", "9000", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Serve { port: Some(9000), host: None }));
    }

    #[test]
    fn bare_config_defaults_to_printing_defaults() {
        let cli = Cli::try_parse_from(["companion", "config"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: None }));
    }
}
