// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! GIndexChecker CLI - count Google-indexed pages per domain.
//!
//! # Examples
//!
//! ```bash
//! # Configure credentials
//! gindex keys add AIza...
//! gindex cx set 0123456789abcdef
//!
//! # Analyze a list of domains (file, --text or stdin)
//! gindex analyze domains.txt
//! pbpaste | gindex analyze
//!
//! # Show, copy and export the session results
//! gindex results show
//! gindex results copy --tier green
//! gindex results export --output report.csv
//!
//! # JSON output
//! gindex --format json --pretty results show
//! ```

mod commands;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use gindex_core::CoreError;
use gindex_fetch::BatchError;
use gindex_store::StoreError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{analyze, config, cx, extract, keys, results};

// ============================================================================
// CLI Definition
// ============================================================================

/// GIndexChecker CLI - indexed-page counts via the Custom Search API.
#[derive(Parser)]
#[command(name = "gindex")]
#[command(about = "Count Google-indexed pages for a list of domains")]
#[command(long_about = r#"
GIndexChecker runs a `site:` query per domain against the Google Custom
Search JSON API and reports how many pages Google has indexed.

API keys are used in order; when one runs out of quota the next takes
over. Results are kept between runs until `gindex results clear`.

Tiers:
  green   more than 10 pages
  yellow  6 to 10 pages
  orange  1 to 5 pages (or quota exceeded)
  none    0 pages

Examples:
  gindex analyze domains.txt     # Analyze a file
  gindex analyze --text "a.com b.org"
  gindex results copy --tier all # Green + yellow + orange
  gindex keys verify             # Probe every configured key
"#)]
#[command(version)]
#[command(author = "GIndexChecker Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, shows the current results.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Configuration file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Session file to use instead of the default.
    #[arg(long, global = true, value_name = "PATH")]
    pub session: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Analyze domains found in a file, --text or stdin.
    #[command(visible_alias = "a")]
    Analyze(analyze::AnalyzeArgs),

    /// Print the domains that would be analyzed.
    #[command(visible_alias = "x")]
    Extract(extract::ExtractArgs),

    /// Show, copy, export or clear session results.
    #[command(visible_alias = "r")]
    Results(results::ResultsArgs),

    /// Manage API keys.
    #[command(visible_alias = "k")]
    Keys(keys::KeysArgs),

    /// Manage the search engine id.
    Cx(cx::CxArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// API keys and/or search engine id not configured.
    ConfigMissing = 2,
    /// The provider rejected the search engine id.
    InvalidSearchEngine = 3,
    /// Another run holds the session.
    RunInProgress = 4,
}

impl ExitCode {
    /// Picks the exit code for an error that reached `main`.
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(batch) = err.downcast_ref::<BatchError>() {
            return match batch {
                BatchError::ConfigurationMissing(_) => ExitCode::ConfigMissing,
                BatchError::InvalidSearchEngine { .. } => ExitCode::InvalidSearchEngine,
                BatchError::Core(_) | BatchError::TaskFailed(_) => ExitCode::Error,
            };
        }
        if let Some(CoreError::ConfigurationMissing(_)) = err.downcast_ref::<CoreError>() {
            return ExitCode::ConfigMissing;
        }
        if err.downcast_ref::<StoreError>().is_some_and(StoreError::is_run_in_progress) {
            return ExitCode::RunInProgress;
        }
        ExitCode::Error
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("gindex=debug,info")
    } else {
        EnvFilter::new("gindex=warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let result = match &cli.command {
        Some(Commands::Analyze(args)) => analyze::run(args, &cli).await,
        Some(Commands::Extract(args)) => extract::run(args, &cli).await,
        Some(Commands::Results(args)) => results::run(args, &cli).await,
        Some(Commands::Keys(args)) => keys::run(args, &cli).await,
        Some(Commands::Cx(args)) => cx::run(args, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &cli).await,
        None => results::show(&cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
