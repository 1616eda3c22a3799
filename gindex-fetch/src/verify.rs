//! API key verification.
//!
//! Each key is probed once against a deliberately bogus cx. A key the
//! provider accepts fails on the cx instead ("invalid argument"), which is
//! how a working key is told apart from a rejected one without spending a
//! real query.

use std::sync::Arc;

use gindex_core::{mask_key, ApiKey};
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::api::{classify_error_message, parse_error_message, ErrorClass};
use crate::client::SearchBackend;

/// cx sent with verification probes.
pub const PROBE_CX: &str = "invalid_cx_placeholder";

/// Query sent with verification probes.
pub const PROBE_QUERY: &str = "test";

/// Verdict for one key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum KeyStatus {
    /// Accepted by the provider.
    Valid,
    /// Rejected as unknown or malformed.
    Invalid,
    /// Out of quota.
    QuotaExceeded(String),
    /// Provider returned some other error.
    Error(String),
    /// No usable answer (transport failure or unreadable body).
    Failure(String),
}

impl KeyStatus {
    /// Returns true for [`KeyStatus::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, KeyStatus::Valid)
    }
}

/// Verification result for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyVerification {
    /// The key probed.
    pub key: ApiKey,
    /// Its verdict.
    pub status: KeyStatus,
}

/// Probes API keys one at a time.
pub struct KeyVerifier {
    backend: Arc<dyn SearchBackend>,
}

impl KeyVerifier {
    /// Creates a verifier over `backend`.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Verifies every key, in order.
    pub async fn verify_all(&self, keys: &[ApiKey]) -> Vec<KeyVerification> {
        let mut results = Vec::with_capacity(keys.len());
        for key in keys {
            let status = self.verify(key).await;
            results.push(KeyVerification {
                key: key.clone(),
                status,
            });
        }
        results
    }

    /// Verifies a single key.
    #[instrument(skip_all, fields(key = %mask_key(key)))]
    pub async fn verify(&self, key: &str) -> KeyStatus {
        let response = match self.backend.search(key, PROBE_CX, PROBE_QUERY).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Verification request failed");
                return KeyStatus::Failure(e.to_string());
            }
        };

        if response.status == 200 {
            debug!("Key accepted");
            return KeyStatus::Valid;
        }

        let Some(message) = parse_error_message(&response.body) else {
            return KeyStatus::Failure(format!(
                "unreadable response (status {})",
                response.status
            ));
        };

        let status = match classify_error_message(&message) {
            ErrorClass::QuotaExceeded => KeyStatus::QuotaExceeded(message),
            ErrorClass::InvalidSearchEngine if response.status == 400 => KeyStatus::Valid,
            ErrorClass::KeyRejected if response.status == 400 => KeyStatus::Invalid,
            _ => KeyStatus::Error(message),
        };
        debug!(status = ?status, "Key verified");
        status
    }
}
