//! Keys command - manage and verify API keys.

use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Subcommand};
use gindex_core::mask_key;
use gindex_fetch::{CseClient, KeyVerifier};

use super::{open_config, open_session};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the keys command.
#[derive(Args)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: KeysAction,
}

/// Keys subcommands.
#[derive(Subcommand)]
pub enum KeysAction {
    /// List keys with their query counts.
    List {
        /// Show keys unmasked.
        #[arg(long)]
        reveal: bool,
    },

    /// Add a key at the end of the rotation.
    Add {
        /// The API key.
        key: String,
    },

    /// Remove a key.
    Remove {
        /// The API key.
        key: String,
    },

    /// Probe every key against the API.
    Verify,
}

/// Runs the keys command.
pub async fn run(args: &KeysArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        KeysAction::List { reveal } => list(*reveal, cli).await,
        KeysAction::Add { key } => add(key, cli).await,
        KeysAction::Remove { key } => remove(key, cli).await,
        KeysAction::Verify => verify(cli).await,
    }
}

async fn list(reveal: bool, cli: &Cli) -> Result<()> {
    let keys = open_config(cli).await.api_keys().await;
    let usage = open_session(cli).await.key_usage().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_keys(&keys, &usage, reveal));
        }
        OutputFormat::Json => {
            let json = JsonFormatter::new(cli.pretty);
            println!("{}", json.format(&json.key_rows(&keys, &usage, reveal))?);
        }
    }

    Ok(())
}

async fn add(key: &str, cli: &Cli) -> Result<()> {
    let store = open_config(cli).await;
    store.add_key(key).await?;

    if !cli.quiet {
        println!("Added API key {}", mask_key(key.trim()));
    }
    Ok(())
}

async fn remove(key: &str, cli: &Cli) -> Result<()> {
    let store = open_config(cli).await;
    if !store.api_keys().await.iter().any(|k| k == key.trim()) {
        anyhow::bail!("API key {} is not configured", mask_key(key.trim()));
    }

    // Session first: a running batch refuses the change before config is touched.
    open_session(cli).await.forget_key(key).await?;
    store.remove_key(key).await?;

    if !cli.quiet {
        println!("Removed API key {}", mask_key(key.trim()));
    }
    Ok(())
}

async fn verify(cli: &Cli) -> Result<()> {
    let keys = open_config(cli).await.api_keys().await;
    if keys.is_empty() {
        anyhow::bail!("No API keys configured");
    }

    let verifier = KeyVerifier::new(Arc::new(CseClient::new()?));
    let results = verifier.verify_all(&keys).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_verification(&results));
        }
        OutputFormat::Json => {
            let json = JsonFormatter::new(cli.pretty);
            println!("{}", json.format(&json.verification_rows(&results))?);
        }
    }

    Ok(())
}
