//! Domain models for GIndexChecker.
//!
//! ## Submodules
//!
//! - [`domain`] - Domain tokens and text extraction
//! - [`key_pool`] - API key rotation and usage counters
//! - [`result`] - Result entries, the session cache and tiers
//! - [`search`] - Search engine id and pre-run validation
//! - [`language`] - Interface language strings used by exports

pub mod domain;
pub mod key_pool;
pub mod language;
pub mod result;
pub mod search;

pub use domain::{extract_domains, site_search_url, split_lines, Domain};
pub use key_pool::{mask_key, ApiKey, KeyPool, MAX_KEY_LEN};
pub use language::Language;
pub use result::{CachedResult, ResultCache, ResultEntry, Tier, TierBuckets};
pub use search::{ensure_configured, SearchEngineId};
