//! Fetch error types.

use gindex_core::{CoreError, MissingConfig};
use thiserror::Error;

// ============================================================================
// Fetch Error
// ============================================================================

/// Error type for a single request to the search provider.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response could not be interpreted.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Batch Error
// ============================================================================

/// Conditions that stop a batch run as a whole.
///
/// Per-domain problems never surface here; they end up in the report.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Keys or cx missing; nothing was queried.
    #[error("Configuration missing: {0}")]
    ConfigurationMissing(MissingConfig),

    /// The provider rejected the search engine id. Nothing from the run was kept.
    #[error("Invalid search engine id (cx) while querying {domain}: {message}")]
    InvalidSearchEngine {
        /// Domain being queried when the provider rejected the cx.
        domain: String,
        /// Provider message.
        message: String,
    },

    /// Core error.
    #[error("Core error: {0}")]
    Core(CoreError),

    /// The background task died.
    #[error("Batch task failed: {0}")]
    TaskFailed(String),
}

impl From<CoreError> for BatchError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConfigurationMissing(what) => BatchError::ConfigurationMissing(what),
            other => BatchError::Core(other),
        }
    }
}

impl From<tokio::task::JoinError> for BatchError {
    fn from(err: tokio::task::JoinError) -> Self {
        BatchError::TaskFailed(err.to_string())
    }
}

