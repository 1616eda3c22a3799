//! Cx command - show or set the search engine id.

use anyhow::Result;
use clap::{Args, Subcommand};

use super::open_config;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the cx command.
#[derive(Args)]
pub struct CxArgs {
    #[command(subcommand)]
    pub action: CxAction,
}

/// Cx subcommands.
#[derive(Subcommand)]
pub enum CxAction {
    /// Show the configured id.
    Show,

    /// Set the id.
    Set {
        /// Programmable Search Engine id.
        cx: String,
    },
}

/// Runs the cx command.
pub async fn run(args: &CxArgs, cli: &Cli) -> Result<()> {
    let store = open_config(cli).await;

    match &args.action {
        CxAction::Show => {
            let cx = store.search_engine_id().await;
            match cli.format {
                OutputFormat::Text if cx.is_empty() => println!("(not set)"),
                OutputFormat::Text => println!("{cx}"),
                OutputFormat::Json => {
                    let out = serde_json::json!({ "cx": cx.as_str() });
                    println!("{}", JsonFormatter::new(cli.pretty).format(&out)?);
                }
            }
        }
        CxAction::Set { cx } => {
            if cx.trim().is_empty() {
                anyhow::bail!("Search engine id cannot be empty");
            }
            store.set_cx(cx).await?;
            if !cli.quiet {
                println!("Search engine id set to: {}", cx.trim());
            }
        }
    }

    Ok(())
}
