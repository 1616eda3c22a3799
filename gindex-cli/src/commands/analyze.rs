//! Analyze command - look up indexed counts for the domains in the input.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use gindex_fetch::{BatchCompletion, BatchError, BatchReport, BatchRunner, CseClient, QueryEngine};
use gindex_store::SessionStore;
use tracing::{debug, info};

use super::{open_config, open_session, InputArgs};
use crate::output::{FailureOutput, JsonFormatter, ResultsOutput, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args, Debug, Default)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Clear previous results before running.
    #[arg(long)]
    pub fresh: bool,
}

/// Runs the analyze command.
pub async fn run(args: &AnalyzeArgs, cli: &Cli) -> Result<()> {
    let domains = args.input.domains().await?;
    if domains.is_empty() {
        anyhow::bail!("No domains found in the input");
    }
    info!(domains = domains.len(), "Analyzing");

    let config_store = open_config(cli).await;
    let config = config_store.get().await;
    config.validate().map_err(BatchError::from)?;

    let session = open_session(cli).await;
    if args.fresh {
        session.clear_results().await?;
    }

    let client = CseClient::new()?;
    let runner = BatchRunner::new(QueryEngine::new(Arc::new(client)), config.search_engine_id());

    let ticket = session.begin_run().await?;
    let pool = config.key_pool(&ticket.key_usage);
    let mut handle = runner.spawn(domains, ticket.cache, pool);

    let formatter = TextFormatter::new(!cli.no_color);
    while let Some(event) = handle.next_event().await {
        debug!(event = ?event, "Batch progress");
        if !cli.quiet {
            if let Some(line) = formatter.format_event(&event) {
                eprintln!("{line}");
            }
        }
    }

    let completion = match handle.join().await {
        Ok(completion) => completion,
        Err(e) => {
            // Task died; state it held is gone, so only release the gate.
            session.abort_run(&config.key_pool(&ticket.key_usage)).await?;
            return Err(e.into());
        }
    };
    let report = settle(&session, completion).await?;

    let view = session.view().await;
    match cli.format {
        OutputFormat::Text => {
            if !report.failures.is_empty() && !cli.quiet {
                eprintln!("{}", formatter.format_failures(&report.failures));
            }
            println!(
                "{}",
                formatter.format_results(&view, config.language, Some(report.keys_used.len()))
            );
            if report.has_pending() {
                println!();
                println!("{}", config.language.not_processed_notice(report.not_processed.len()));
            }
        }
        OutputFormat::Json => {
            let json = JsonFormatter::new(cli.pretty);
            let output = ResultsOutput {
                keys_used: Some(report.keys_used.len()),
                results: json.result_rows(&view, config.language),
                not_processed: report.not_processed.clone(),
                failures: report
                    .failures
                    .iter()
                    .map(|f| FailureOutput {
                        domain: f.domain.clone(),
                        error: f.failure.to_string(),
                    })
                    .collect(),
            };
            println!("{}", json.format(&output)?);
        }
    }

    Ok(())
}

/// Hands a finished batch back to the session, which saves and unlocks.
///
/// An aborted run keeps the stored cache and pending list as they were.
async fn settle(session: &SessionStore, completion: BatchCompletion) -> Result<BatchReport> {
    match completion.result {
        Ok(report) => {
            session
                .complete_run(completion.cache, &completion.pool, report.not_processed.clone())
                .await?;
            Ok(report)
        }
        Err(e) => {
            session.abort_run(&completion.pool).await?;
            Err(e.into())
        }
    }
}
