//! Search credentials handed to a batch run.

use serde::{Deserialize, Serialize};

use super::key_pool::KeyPool;
use crate::error::{CoreError, MissingConfig};

/// Programmable Search Engine id ("cx"), shared by every query of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchEngineId(String);

impl SearchEngineId {
    /// Creates an id, trimming surrounding whitespace.
    pub fn new(cx: impl AsRef<str>) -> Self {
        Self(cx.as_ref().trim().to_string())
    }

    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if no id is set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for SearchEngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Checks that a run has both keys and a cx before anything is queried.
///
/// # Errors
///
/// Returns [`CoreError::ConfigurationMissing`] naming what is missing.
pub fn ensure_configured(pool: &KeyPool, cx: &SearchEngineId) -> Result<(), CoreError> {
    let missing = match (pool.is_empty(), cx.is_empty()) {
        (true, true) => Some(MissingConfig::Both),
        (true, false) => Some(MissingConfig::ApiKeys),
        (false, true) => Some(MissingConfig::SearchEngineId),
        (false, false) => None,
    };
    match missing {
        Some(what) => Err(CoreError::ConfigurationMissing(what)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_configured() {
        let keys = KeyPool::new(["k"]);
        let none = KeyPool::default();
        let cx = SearchEngineId::new(" abc ");
        let blank = SearchEngineId::default();

        assert_eq!(cx.as_str(), "abc");
        assert!(ensure_configured(&keys, &cx).is_ok());
        assert!(matches!(
            ensure_configured(&none, &cx),
            Err(CoreError::ConfigurationMissing(MissingConfig::ApiKeys))
        ));
        assert!(matches!(
            ensure_configured(&keys, &blank),
            Err(CoreError::ConfigurationMissing(MissingConfig::SearchEngineId))
        ));
        assert!(matches!(
            ensure_configured(&none, &blank),
            Err(CoreError::ConfigurationMissing(MissingConfig::Both))
        ));
    }
}
