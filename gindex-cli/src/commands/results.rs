//! Results command - show, copy, export or clear the session results.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};
use gindex_core::{Domain, Tier, TierBuckets};
use tracing::info;

use super::{open_config, open_session};
use crate::output::export::{default_export_name, export_results};
use crate::output::{JsonFormatter, ResultsOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the results command.
#[derive(Args)]
pub struct ResultsArgs {
    #[command(subcommand)]
    pub action: Option<ResultsAction>,
}

/// Results subcommands.
#[derive(Subcommand)]
pub enum ResultsAction {
    /// Show results, highest counts first (default).
    Show,

    /// Print the domains of a tier, one per line.
    Copy {
        /// Tier to copy.
        #[arg(long, short, default_value = "all")]
        tier: CopyTier,
    },

    /// Write results to a CSV file.
    Export {
        /// Output file. Defaults to GIndexChecker_<date>_<time>.csv.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Forget all results and pending domains.
    Clear,
}

/// Tier selection for copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CopyTier {
    /// More than 10 pages.
    Green,
    /// 6 to 10 pages.
    Yellow,
    /// 1 to 5 pages or quota exceeded.
    Orange,
    /// Green, yellow and orange.
    All,
}

impl CopyTier {
    /// Picks the matching domains out of `buckets`.
    pub fn select(self, buckets: &TierBuckets) -> Vec<Domain> {
        match self {
            CopyTier::Green => buckets.get(Tier::Green).to_vec(),
            CopyTier::Yellow => buckets.get(Tier::Yellow).to_vec(),
            CopyTier::Orange => buckets.get(Tier::Orange).to_vec(),
            CopyTier::All => buckets.copy_all(),
        }
    }
}

/// Runs the results command.
pub async fn run(args: &ResultsArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        None | Some(ResultsAction::Show) => show(cli).await,
        Some(ResultsAction::Copy { tier }) => copy(*tier, cli).await,
        Some(ResultsAction::Export { output }) => export(output.clone(), cli).await,
        Some(ResultsAction::Clear) => clear(cli).await,
    }
}

/// Shows the current results.
pub async fn show(cli: &Cli) -> Result<()> {
    let language = open_config(cli).await.language().await;
    let state = open_session(cli).await.get().await;
    let view = state.view();

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_results(&view, language, None));
            if !state.pending.is_empty() && !cli.quiet {
                println!();
                println!("{}", language.not_processed_notice(state.pending.len()));
            }
        }
        OutputFormat::Json => {
            let json = JsonFormatter::new(cli.pretty);
            let output = ResultsOutput {
                keys_used: None,
                results: json.result_rows(&view, language),
                not_processed: state.pending,
                failures: Vec::new(),
            };
            println!("{}", json.format(&output)?);
        }
    }

    Ok(())
}

async fn copy(tier: CopyTier, cli: &Cli) -> Result<()> {
    let view = open_session(cli).await.view().await;
    let domains = tier.select(&view.buckets());

    match cli.format {
        OutputFormat::Text => {
            if domains.is_empty() {
                if !cli.quiet {
                    eprintln!("There are no analyzed domains to copy.");
                }
            } else {
                println!("{}", domains.join("\n"));
            }
        }
        OutputFormat::Json => {
            println!("{}", JsonFormatter::new(cli.pretty).format(&domains)?);
        }
    }

    Ok(())
}

async fn export(output: Option<PathBuf>, cli: &Cli) -> Result<()> {
    let view = open_session(cli).await.view().await;
    if view.is_empty() {
        anyhow::bail!("No results to export. Run `gindex analyze` first.");
    }

    let language = open_config(cli).await.language().await;
    let path = output.unwrap_or_else(|| PathBuf::from(default_export_name(chrono::Local::now())));
    let rows = export_results(&path, &view, language)?;
    info!(path = %path.display(), rows, "Results exported");

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Exported {rows} results to {}", path.display());
            }
        }
        OutputFormat::Json => {
            let out = serde_json::json!({
                "path": path.display().to_string(),
                "rows": rows,
            });
            println!("{}", JsonFormatter::new(cli.pretty).format(&out)?);
        }
    }

    Ok(())
}

async fn clear(cli: &Cli) -> Result<()> {
    let session = open_session(cli).await;
    session.clear_results().await?;

    if !cli.quiet {
        println!("Results cleared");
    }
    Ok(())
}
