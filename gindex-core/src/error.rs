//! Core error types for GIndexChecker.

use thiserror::Error;

/// Which part of the search configuration is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingConfig {
    /// No API key configured.
    ApiKeys,
    /// No search engine id (cx) configured.
    SearchEngineId,
    /// Neither keys nor cx configured.
    Both,
}

impl std::fmt::Display for MissingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingConfig::ApiKeys => write!(f, "configure at least one API key"),
            MissingConfig::SearchEngineId => write!(f, "configure the search engine id (cx)"),
            MissingConfig::Both => {
                write!(f, "configure at least one API key and the search engine id (cx)")
            }
        }
    }
}

/// Core error type for GIndexChecker operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Keys and/or cx are not configured; a batch cannot start.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(MissingConfig),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// API key not present in the pool.
    #[error("Unknown API key: {0}")]
    UnknownKey(String),
}
