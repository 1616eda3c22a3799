//! API key rotation pool.
//!
//! Keys are tried strictly in order. Within one batch run the cursor only
//! moves forward: a key that hit its quota (or was rejected) is never
//! revisited until the next run resets the cursor.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// An opaque Custom Search API credential.
pub type ApiKey = String;

/// Longest key accepted by [`KeyPool::add_key`].
pub const MAX_KEY_LEN: usize = 100;

// ============================================================================
// Key Pool
// ============================================================================

/// Ordered API keys with per-key usage counters and a rotation cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPool {
    keys: Vec<ApiKey>,
    #[serde(default)]
    usage: HashMap<ApiKey, u64>,
    #[serde(skip)]
    current: usize,
}

impl KeyPool {
    /// Creates a pool from configured keys.
    ///
    /// Keys are trimmed; blanks and exact duplicates are dropped.
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pool = Self::default();
        for key in keys {
            let key = key.as_ref().trim();
            if !key.is_empty() && !pool.contains(key) {
                pool.usage.insert(key.to_string(), 0);
                pool.keys.push(key.to_string());
            }
        }
        pool
    }

    /// Restores usage counters from a previous session.
    ///
    /// Counters for keys that are no longer in the pool are ignored.
    pub fn with_usage(mut self, usage: &HashMap<ApiKey, u64>) -> Self {
        for (key, count) in usage {
            if let Some(slot) = self.usage.get_mut(key) {
                *slot = *count;
            }
        }
        self
    }

    /// Returns the key under the cursor, or `None` once exhausted.
    pub fn current_key(&self) -> Option<&str> {
        self.keys.get(self.current).map(String::as_str)
    }

    /// Returns the cursor position.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Moves the cursor to the next key. Saturates at `len()`.
    pub fn advance(&mut self) {
        if self.current < self.keys.len() {
            self.current += 1;
        }
    }

    /// Rewinds the cursor to the first key. Only done at the start of a run.
    pub fn reset(&mut self) {
        self.current = 0;
    }

    /// Returns true when every key has been advanced past.
    pub fn is_exhausted(&self) -> bool {
        self.current >= self.keys.len()
    }

    /// Counts one successful query against `key`.
    pub fn record_use(&mut self, key: &str) {
        if let Some(count) = self.usage.get_mut(key) {
            *count += 1;
        }
    }

    /// Returns the successful query count for `key`.
    pub fn usage(&self, key: &str) -> u64 {
        self.usage.get(key).copied().unwrap_or(0)
    }

    /// Returns all usage counters.
    pub fn usage_counts(&self) -> &HashMap<ApiKey, u64> {
        &self.usage
    }

    /// Adds a key at the end of the rotation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidConfig`] for blank, oversized or duplicate keys.
    pub fn add_key(&mut self, key: &str) -> Result<(), CoreError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(CoreError::InvalidConfig("API key is empty".to_string()));
        }
        if key.len() > MAX_KEY_LEN {
            return Err(CoreError::InvalidConfig(format!(
                "API key longer than {MAX_KEY_LEN} characters"
            )));
        }
        if self.contains(key) {
            return Err(CoreError::InvalidConfig(format!(
                "API key already configured: {}",
                mask_key(key)
            )));
        }
        self.keys.push(key.to_string());
        self.usage.entry(key.to_string()).or_insert(0);
        Ok(())
    }

    /// Removes a key and its usage counter.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownKey`] if the key is not in the pool.
    pub fn remove_key(&mut self, key: &str) -> Result<(), CoreError> {
        let key = key.trim();
        let Some(pos) = self.keys.iter().position(|k| k == key) else {
            return Err(CoreError::UnknownKey(mask_key(key)));
        };
        self.keys.remove(pos);
        self.usage.remove(key);
        if pos < self.current {
            self.current -= 1;
        }
        Ok(())
    }

    /// Returns true if `key` is in the pool.
    pub fn contains(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }

    /// Returns the keys in rotation order.
    pub fn keys(&self) -> &[ApiKey] {
        &self.keys
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if the pool has no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Masks a key for logs and listings: `AIza…wxyz`.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}…{tail}")
}

// ============================================================================
// Tests
// ============================================================================
