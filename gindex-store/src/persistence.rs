//! File persistence helpers.
//!
//! Both files this crate writes hold API keys or data derived from them, so
//! they get owner-only permissions on Unix.

use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::StoreError;

#[cfg(not(target_os = "macos"))]
const APP_DIR: &str = "gindexchecker";
#[cfg(target_os = "macos")]
const APP_DIR: &str = "GIndexChecker";

// ============================================================================
// Default Paths
// ============================================================================

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.map(|b| b.join(APP_DIR)).unwrap_or_else(|| PathBuf::from("."))
}

/// Returns the directory holding `config.json`.
pub fn default_config_dir() -> PathBuf {
    app_dir(dirs::config_dir())
}

/// Returns the directory holding `session.json`.
pub fn default_cache_dir() -> PathBuf {
    app_dir(dirs::cache_dir())
}

/// Returns the default `config.json` path.
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.json")
}

/// Returns the default session file path.
pub fn default_session_path() -> PathBuf {
    default_cache_dir().join("session.json")
}

// ============================================================================
// Security: File Permissions
// ============================================================================

#[cfg(unix)]
async fn set_mode(path: &Path, mode: u32) -> Result<(), StoreError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = tokio::fs::metadata(path).await?.permissions();
    perms.set_mode(mode);
    tokio::fs::set_permissions(path, perms).await?;

    debug!(path = %path.display(), mode = %format!("{mode:o}"), "Set permissions");
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_path: &Path, _mode: u32) -> Result<(), StoreError> {
    Ok(())
}

/// Owner read/write only.
async fn set_restrictive_permissions(path: &Path) -> Result<(), StoreError> {
    set_mode(path, 0o600).await
}

/// Owner only.
async fn set_restrictive_dir_permissions(path: &Path) -> Result<(), StoreError> {
    set_mode(path, 0o700).await
}

// ============================================================================
// File Operations
// ============================================================================

/// Creates the parent directory (0700) if it is missing.
///
/// Only the innermost directory is tightened; pre-existing ancestors are
/// left alone.
pub(crate) async fn create_secure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!(path = %parent.display(), "Creating secure directory");
            tokio::fs::create_dir_all(parent).await?;
            set_restrictive_dir_permissions(parent).await?;
        }
    }
    Ok(())
}

/// Saves data to a JSON file with secure permissions.
///
/// Creates the parent directory if needed, writes atomically (temp file +
/// rename), and sets 0600 on Unix.
///
/// # Errors
///
/// Returns an error if serialization or any filesystem step fails.
pub async fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<(), StoreError> {
    debug!(path = %path.display(), "Saving JSON file");

    create_secure_parent_dir(path).await?;

    let json = serde_json::to_string_pretty(data)?;

    let temp_path = path.with_extension("json.tmp");
    tokio::fs::write(&temp_path, &json).await?;
    set_restrictive_permissions(&temp_path).await?;
    tokio::fs::rename(&temp_path, path).await?;

    debug!(path = %path.display(), bytes = json.len(), "JSON file saved");
    Ok(())
}

/// Loads data from a JSON file.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read and
/// [`StoreError::Serialization`] if it is not valid JSON for `T`.
pub async fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    debug!(path = %path.display(), "Loading JSON file");

    let content = tokio::fs::read_to_string(path).await?;
    let data = serde_json::from_str(&content)?;

    Ok(data)
}

/// Loads data from a JSON file, returning the default if missing or malformed.
///
/// A missing file is silent; anything else is logged.
pub async fn load_json_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    match load_json(path).await {
        Ok(data) => data,
        Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "File not found, using defaults");
            T::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load, using defaults");
            T::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
