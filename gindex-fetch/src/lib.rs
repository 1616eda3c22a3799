// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GIndexChecker Fetch
//!
//! Talks to the Google Custom Search JSON API and turns its answers into
//! indexed-page counts.
//!
//! ## Layers
//!
//! - [`client::SearchBackend`] - One request in, status and body out
//! - [`api`] - Payload parsing and the error-message classification table
//! - [`engine::QueryEngine`] - One domain, rotating keys as they run dry
//! - [`batch::BatchRunner`] - Many domains, cache-aware, on a background task
//! - [`verify::KeyVerifier`] - Probes keys without spending real queries
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gindex_fetch::{BatchRunner, CseClient, QueryEngine};
//!
//! let engine = QueryEngine::new(Arc::new(CseClient::new()?));
//! let runner = BatchRunner::new(engine, cx);
//!
//! let mut handle = runner.spawn(domains, cache, pool);
//! while let Some(event) = handle.next_event().await {
//!     println!("{event:?}");
//! }
//! let completion = handle.join().await?;
//! ```

pub mod api;
pub mod batch;
pub mod client;
pub mod engine;
pub mod error;
pub mod verify;

#[cfg(test)]
mod testing;

// Errors
pub use error::{BatchError, FetchError};

// Transport
pub use client::{CseClient, RawResponse, SearchBackend, CUSTOM_SEARCH_URL};

// Lookups
pub use api::{classify_error_message, ErrorClass, ERROR_CLASSIFICATION};
pub use batch::{BatchCompletion, BatchEvent, BatchHandle, BatchReport, BatchRunner, DomainFailure};
pub use engine::{Outcome, QueryEngine, QueryFailure};
pub use verify::{KeyStatus, KeyVerification, KeyVerifier};
