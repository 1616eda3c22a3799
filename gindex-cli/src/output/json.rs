//! JSON output formatting.

use std::collections::HashMap;

use anyhow::Result;
use gindex_core::{mask_key, site_search_url, ApiKey, Domain, Language, ResultCache, ResultEntry};
use gindex_fetch::{KeyStatus, KeyVerification};
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// One result row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultOutput {
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    pub quota_exceeded: bool,
    pub tier: String,
    pub display: String,
    pub search_url: String,
}

/// Results view, optionally with run details.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keys_used: Option<usize>,
    pub results: Vec<ResultOutput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_processed: Vec<Domain>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureOutput>,
}

/// A domain that failed during the run.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureOutput {
    pub domain: String,
    pub error: String,
}

/// One configured key.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyOutput {
    pub key: String,
    pub queries: u64,
}

/// One verification result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutput {
    pub key: String,
    #[serde(flatten)]
    pub status: KeyStatus,
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Converts a results view into output rows, in display order.
    pub fn result_rows(&self, view: &ResultCache, language: Language) -> Vec<ResultOutput> {
        view.sorted()
            .into_iter()
            .map(|(domain, entry)| ResultOutput {
                domain: domain.to_string(),
                count: entry.count(),
                quota_exceeded: entry.is_quota_exceeded(),
                tier: entry.tier().to_string(),
                display: match entry {
                    ResultEntry::Count(n) => n.to_string(),
                    ResultEntry::QuotaExceeded => language.quota_exceeded_label().to_string(),
                },
                search_url: site_search_url(domain),
            })
            .collect()
    }

    /// Converts the key list, masking unless `reveal`.
    pub fn key_rows(&self, keys: &[ApiKey], usage: &HashMap<ApiKey, u64>, reveal: bool) -> Vec<KeyOutput> {
        keys.iter()
            .map(|k| KeyOutput {
                key: if reveal { k.clone() } else { mask_key(k) },
                queries: usage.get(k).copied().unwrap_or(0),
            })
            .collect()
    }

    /// Converts verification results, with masked keys.
    pub fn verification_rows(&self, results: &[KeyVerification]) -> Vec<VerificationOutput> {
        results
            .iter()
            .map(|r| VerificationOutput {
                key: mask_key(&r.key),
                status: r.status.clone(),
            })
            .collect()
    }
}
