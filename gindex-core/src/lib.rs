// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GIndexChecker Core
//!
//! Core types and pure logic shared by every GIndexChecker crate:
//!
//! - Domain extraction from pasted text
//! - The API key pool and its rotation cursor
//! - Result entries, the session result cache and tier classification
//! - Error types
//!
//! Nothing in this crate performs I/O.
//!
//! ## Key Types
//!
//! - [`KeyPool`] - Ordered keys, usage counters, forward-only cursor
//! - [`SearchEngineId`] - The shared "cx" identifier
//! - [`ResultCache`] - Domain → [`ResultEntry`] in insertion order
//! - [`Tier`] / [`TierBuckets`] - Classification for display and copy

pub mod error;
pub mod models;

pub use error::{CoreError, MissingConfig};

pub use models::{
    // Domains
    extract_domains,
    site_search_url,
    split_lines,
    Domain,
    // Keys
    mask_key,
    ApiKey,
    KeyPool,
    MAX_KEY_LEN,
    // Results
    CachedResult,
    ResultCache,
    ResultEntry,
    Tier,
    TierBuckets,
    // Configuration
    ensure_configured,
    Language,
    SearchEngineId,
};
