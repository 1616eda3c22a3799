//! The persisted `config.json`.
//!
//! The on-disk field names (`API_KEYS`, `CX`, `language`) are kept as-is so
//! existing config files keep loading.

use std::collections::HashMap;

use gindex_core::{ensure_configured, ApiKey, CoreError, KeyPool, Language, SearchEngineId};
use serde::{Deserialize, Serialize};

/// User configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API keys in rotation order.
    #[serde(rename = "API_KEYS")]
    pub api_keys: Vec<ApiKey>,

    /// Programmable Search Engine id.
    #[serde(rename = "CX")]
    pub cx: String,

    /// UI language.
    pub language: Language,
}

impl AppConfig {
    /// Trims keys and cx, dropping blank and repeated keys.
    pub fn normalize(&mut self) {
        let pool = KeyPool::new(&self.api_keys);
        self.api_keys = pool.keys().to_vec();
        self.cx = self.cx.trim().to_string();
    }

    /// Returns a normalized copy.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.normalize();
        self
    }

    /// Builds a key pool, restoring usage counters from `usage`.
    pub fn key_pool(&self, usage: &HashMap<ApiKey, u64>) -> KeyPool {
        KeyPool::new(&self.api_keys).with_usage(usage)
    }

    /// Returns the search engine id.
    pub fn search_engine_id(&self) -> SearchEngineId {
        SearchEngineId::new(&self.cx)
    }

    /// Checks that keys and cx are both present.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigurationMissing`] naming what is missing.
    pub fn validate(&self) -> Result<(), CoreError> {
        ensure_configured(&KeyPool::new(&self.api_keys), &self.search_engine_id())
    }
}
