//! Store error types.

use gindex_core::CoreError;
use thiserror::Error;

/// Errors that can occur in the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A batch run is already in flight.
    #[error("A batch run is already in progress")]
    RunInProgress,

    /// No run was started, so there is nothing to complete.
    #[error("No batch run in progress")]
    NoRunInProgress,

    /// The session lock file could not be opened or locked.
    #[error("Session lock error: {0}")]
    Lock(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected by a core invariant (key length, duplicates, ...).
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl StoreError {
    /// Returns true if the operation was refused because a run is active.
    pub fn is_run_in_progress(&self) -> bool {
        matches!(self, StoreError::RunInProgress)
    }
}
