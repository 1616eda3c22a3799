//! CLI command implementations.

pub mod analyze;
pub mod config;
pub mod cx;
pub mod extract;
pub mod keys;
pub mod results;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use gindex_core::{extract_domains, split_lines, Domain};
use gindex_store::{ConfigStore, SessionStore};
use tokio::io::AsyncReadExt;

use crate::Cli;

/// Where the text to scan comes from.
#[derive(Args, Debug, Default, Clone)]
pub struct InputArgs {
    /// File with domains or free text. Reads stdin when omitted or "-".
    pub file: Option<PathBuf>,

    /// Text to scan instead of a file.
    #[arg(long, short, conflicts_with = "file")]
    pub text: Option<String>,

    /// Take each non-blank line as a domain instead of scanning the text.
    #[arg(long)]
    pub lines: bool,
}

impl InputArgs {
    /// Reads the input text.
    pub async fn read(&self) -> Result<String> {
        if let Some(text) = &self.text {
            return Ok(text.clone());
        }
        match self.file.as_deref() {
            Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read {}", path.display())),
            _ => {
                let mut buf = String::new();
                tokio::io::stdin()
                    .read_to_string(&mut buf)
                    .await
                    .context("Failed to read stdin")?;
                Ok(buf)
            }
        }
    }

    /// Reads the input and returns the domains in it.
    pub async fn domains(&self) -> Result<Vec<Domain>> {
        let text = self.read().await?;
        Ok(if self.lines {
            split_lines(&text)
        } else {
            extract_domains(&text)
        })
    }
}

/// Opens the configuration store honoring `--config`.
pub async fn open_config(cli: &Cli) -> ConfigStore {
    match &cli.config {
        Some(path) => ConfigStore::load(path.clone()).await,
        None => ConfigStore::load_default().await,
    }
}

/// Opens the session store honoring `--session`.
pub async fn open_session(cli: &Cli) -> SessionStore {
    match &cli.session {
        Some(path) => SessionStore::load(path.clone()).await,
        None => SessionStore::load_default().await,
    }
}
