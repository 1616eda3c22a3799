//! Config command - manage configuration.

use anyhow::Result;
use clap::{Args, Subcommand};
use gindex_core::{mask_key, Language};
use tracing::info;

use super::{open_config, open_session};
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration paths.
    Path,

    /// Set the language (es, en).
    Language {
        /// Language code.
        language: Language,
    },

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli).await,
        ConfigAction::Path => show_paths(cli).await,
        ConfigAction::Language { language } => set_language(*language, cli).await,
        ConfigAction::Reset => reset_config(cli).await,
    }
}

async fn show_config(cli: &Cli) -> Result<()> {
    let config = open_config(cli).await.get().await;

    match cli.format {
        OutputFormat::Text => {
            println!("GIndexChecker Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("API keys:");
            if config.api_keys.is_empty() {
                println!("  (none)");
            }
            for key in &config.api_keys {
                println!("  • {}", mask_key(key));
            }
            println!();
            println!(
                "Search engine id: {}",
                if config.cx.is_empty() { "(not set)" } else { config.cx.as_str() }
            );
            println!("Language:         {}", config.language);
            if let Err(e) = config.validate() {
                println!();
                println!("Not ready: {e}");
            }
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "apiKeys": config.api_keys.iter().map(|k| mask_key(k)).collect::<Vec<_>>(),
                "cx": config.cx,
                "language": config.language,
                "ready": config.validate().is_ok(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&out)?);
        }
    }

    Ok(())
}

async fn show_paths(cli: &Cli) -> Result<()> {
    let config_path = open_config(cli).await.path().to_path_buf();
    let session_path = open_session(cli).await.path().to_path_buf();

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config file:  {}", config_path.display());
            println!("Session file: {}", session_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "configFile": config_path.display().to_string(),
                "sessionFile": session_path.display().to_string(),
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&paths)?);
        }
    }

    Ok(())
}

async fn set_language(language: Language, cli: &Cli) -> Result<()> {
    let store = open_config(cli).await;
    store.set_language(language).await?;

    info!(language = %language, "Language updated");
    if !cli.quiet {
        println!("Language set to: {language}");
    }
    Ok(())
}

async fn reset_config(cli: &Cli) -> Result<()> {
    let store = open_config(cli).await;
    store.reset().await?;

    info!(path = %store.path().display(), "Configuration reset");
    if !cli.quiet {
        println!("Configuration reset to defaults");
    }
    Ok(())
}
