// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # GIndexChecker Store
//!
//! State that outlives a single command.
//!
//! This crate provides:
//!
//! - **ConfigStore**: `config.json` (keys, cx, language), saved on every change
//! - **SessionStore**: results cache, pending domains, key usage, and a run
//!   gate shared by every process through a lock file
//! - **Persistence**: Atomic JSON writes with owner-only permissions
//!
//! ## Usage
//!
//! ```ignore
//! use gindex_store::{ConfigStore, SessionStore};
//!
//! let config = ConfigStore::load_default().await;
//! let session = SessionStore::load_default().await;
//!
//! let ticket = session.begin_run().await?;
//! let pool = config.key_pool(&ticket.key_usage).await;
//! // ... run the batch ...
//! session.complete_run(cache, &pool, not_processed).await?; // saves and unlocks
//! ```

pub mod config;
pub mod config_store;
pub mod error;
pub mod persistence;
pub mod session_store;

pub use config::AppConfig;
pub use config_store::ConfigStore;
pub use error::StoreError;
pub use persistence::{
    default_cache_dir, default_config_dir, default_config_path, default_session_path, load_json,
    load_json_or_default, save_json,
};
pub use session_store::{RunTicket, SessionState, SessionStore};
