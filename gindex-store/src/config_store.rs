//! Configuration store.
//!
//! Holds [`AppConfig`] in memory and writes the whole file back after every
//! mutation, so the file on disk always matches what the last command saw.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gindex_core::{mask_key, ApiKey, KeyPool, Language, SearchEngineId};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

/// Persistent configuration.
pub struct ConfigStore {
    config: Arc<RwLock<AppConfig>>,
    path: PathBuf,
}

impl ConfigStore {
    /// Creates an in-memory store with defaults, backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_config(path, AppConfig::default())
    }

    fn with_config(path: PathBuf, config: AppConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
            path,
        }
    }

    /// Loads configuration from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_config_path()).await
    }

    /// Loads configuration from `path`.
    ///
    /// A missing file yields defaults; a malformed one is logged and also
    /// yields defaults. Keys and cx are trimmed on the way in.
    pub async fn load(path: PathBuf) -> Self {
        let config = if path.exists() {
            info!(path = %path.display(), "Loading configuration");
            load_json::<AppConfig>(&path).await.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load configuration, using defaults");
                AppConfig::default()
            })
        } else {
            debug!(path = %path.display(), "Configuration file not found, using defaults");
            AppConfig::default()
        };

        Self::with_config(path, config.normalized())
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a copy of the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.config.read().await.clone()
    }

    /// Applies `f` in memory and re-normalizes. Does not save.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().await;
        f(&mut config);
        config.normalize();
    }

    /// Writes the configuration to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn save(&self) -> Result<(), StoreError> {
        let config = self.config.read().await;
        save_json(&self.path, &*config).await?;
        info!(path = %self.path.display(), keys = config.api_keys.len(), "Configuration saved");
        Ok(())
    }

    // ========================================================================
    // Keys
    // ========================================================================

    /// Returns the configured keys.
    pub async fn api_keys(&self) -> Vec<ApiKey> {
        self.config.read().await.api_keys.clone()
    }

    /// Builds a key pool with usage counters from `usage`.
    pub async fn key_pool(&self, usage: &HashMap<ApiKey, u64>) -> KeyPool {
        self.config.read().await.key_pool(usage)
    }

    /// Appends a key and saves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Core`] for blank, oversized or duplicate keys,
    /// or an I/O error if saving fails.
    pub async fn add_key(&self, key: &str) -> Result<(), StoreError> {
        {
            let mut config = self.config.write().await;
            let mut pool = KeyPool::new(&config.api_keys);
            pool.add_key(key)?;
            config.api_keys = pool.keys().to_vec();
        }
        info!(key = %mask_key(key.trim()), "API key added");
        self.save().await
    }

    /// Removes a key and saves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Core`] if the key is not configured, or an I/O
    /// error if saving fails.
    pub async fn remove_key(&self, key: &str) -> Result<(), StoreError> {
        {
            let mut config = self.config.write().await;
            let mut pool = KeyPool::new(&config.api_keys);
            pool.remove_key(key)?;
            config.api_keys = pool.keys().to_vec();
        }
        info!(key = %mask_key(key.trim()), "API key removed");
        self.save().await
    }

    // ========================================================================
    // Search Engine & Language
    // ========================================================================

    /// Returns the search engine id.
    pub async fn search_engine_id(&self) -> SearchEngineId {
        self.config.read().await.search_engine_id()
    }

    /// Sets the search engine id and saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn set_cx(&self, cx: &str) -> Result<(), StoreError> {
        let cx = cx.trim().to_string();
        self.update(|c| c.cx = cx).await;
        self.save().await
    }

    /// Returns the language.
    pub async fn language(&self) -> Language {
        self.config.read().await.language
    }

    /// Sets the language and saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn set_language(&self, language: Language) -> Result<(), StoreError> {
        self.update(|c| c.language = language).await;
        self.save().await
    }

    /// Restores defaults and saves.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub async fn reset(&self) -> Result<(), StoreError> {
        self.update(|c| *c = AppConfig::default()).await;
        self.save().await
    }
}
