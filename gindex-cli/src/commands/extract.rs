//! Extract command - show which domains an input would produce.

use anyhow::Result;
use clap::Args;

use super::InputArgs;
use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the extract command.
#[derive(Args, Debug, Default)]
pub struct ExtractArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

/// Runs the extract command.
pub async fn run(args: &ExtractArgs, cli: &Cli) -> Result<()> {
    let domains = args.input.domains().await?;

    match cli.format {
        OutputFormat::Text => {
            for domain in &domains {
                println!("{domain}");
            }
            if domains.is_empty() && !cli.quiet {
                eprintln!("No domains found");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&domains)?);
        }
    }

    Ok(())
}
