//! Custom Search JSON API payloads and error classification.
//!
//! The provider does not expose stable error codes for the cases we care
//! about, so classification matches substrings of the lower-cased error
//! message. The table below is the single place that knows those phrases;
//! if Google rewords a message, this is what breaks.

use serde::Deserialize;

// ============================================================================
// Success Payload
// ============================================================================

/// Subset of a successful search response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Aggregate search information.
    #[serde(default)]
    pub search_information: Option<SearchInformation>,
}

/// `searchInformation` block.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInformation {
    /// Total result count, string-encoded by the API.
    #[serde(default)]
    pub total_results: Option<String>,
}

/// Extracts `searchInformation.totalResults` from a 200 body.
///
/// Missing fields, non-numeric values and non-JSON bodies all count as 0.
pub fn parse_total_results(body: &str) -> u64 {
    serde_json::from_str::<SearchResponse>(body)
        .ok()
        .and_then(|r| r.search_information)
        .and_then(|i| i.total_results)
        .and_then(|t| t.trim().parse().ok())
        .unwrap_or(0)
}

// ============================================================================
// Error Payload
// ============================================================================

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
}

/// Returns the provider error message, trimmed.
///
/// Prefers `error.errors[0].message`, falling back to `error.message`.
pub fn parse_error_message(body: &str) -> Option<String> {
    let envelope: ErrorEnvelope = serde_json::from_str(body).ok()?;
    let ErrorBody { message, errors } = envelope.error;
    errors
        .into_iter()
        .next()
        .and_then(|d| d.message)
        .or(message)
        .map(|m| m.trim().to_string())
}

// ============================================================================
// Classification
// ============================================================================

/// What a provider error message means for key rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The cx was rejected. Fatal for the whole batch.
    InvalidSearchEngine,
    /// The key is unknown or malformed. Rotate.
    KeyRejected,
    /// The key is out of quota. Rotate.
    QuotaExceeded,
    /// Anything else.
    Other,
}

impl ErrorClass {
    /// Returns true if the engine should move on to the next key.
    pub fn rotates_key(&self) -> bool {
        matches!(self, ErrorClass::KeyRejected | ErrorClass::QuotaExceeded)
    }
}

/// Known message fragments, checked in order against the lower-cased text.
pub const ERROR_CLASSIFICATION: &[(&str, ErrorClass)] = &[
    ("invalid argument", ErrorClass::InvalidSearchEngine),
    ("api key not valid", ErrorClass::KeyRejected),
    ("api key not found", ErrorClass::KeyRejected),
    ("quota exceeded", ErrorClass::QuotaExceeded),
];

/// Classifies a provider error message.
pub fn classify_error_message(message: &str) -> ErrorClass {
    let lower = message.to_lowercase();
    ERROR_CLASSIFICATION
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map_or(ErrorClass::Other, |(_, class)| *class)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_total_results() {
        let body = r#"{"searchInformation":{"totalResults":"1234","searchTime":0.2}}"#;
        assert_eq!(parse_total_results(body), 1234);
    }

    #[test]
    fn test_parse_total_results_defaults_to_zero() {
        assert_eq!(parse_total_results(r#"{"kind":"customsearch#search"}"#), 0);
        assert_eq!(parse_total_results(r#"{"searchInformation":{}}"#), 0);
        assert_eq!(parse_total_results(r#"{"searchInformation":{"totalResults":"lots"}}"#), 0);
        assert_eq!(parse_total_results("not json"), 0);
    }

    #[test]
    fn test_parse_error_message_prefers_first_error() {
        let body = r#"{"error":{"code":400,"message":"outer","errors":[{"message":" Request contains an invalid argument. ","domain":"global"}]}}"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("Request contains an invalid argument.")
        );
    }

    #[test]
    fn test_parse_error_message_falls_back_to_outer() {
        let body = r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key."}}"#;
        assert_eq!(
            parse_error_message(body).as_deref(),
            Some("API key not valid. Please pass a valid API key.")
        );
        assert_eq!(parse_error_message("<html>oops</html>"), None);
    }

    #[test]
    fn test_classification_table() {
        assert_eq!(
            classify_error_message("Request contains an invalid argument."),
            ErrorClass::InvalidSearchEngine
        );
        assert_eq!(
            classify_error_message("API key not valid. Please pass a valid API key."),
            ErrorClass::KeyRejected
        );
        assert_eq!(classify_error_message("API Key not found."), ErrorClass::KeyRejected);
        assert_eq!(
            classify_error_message("Quota exceeded for quota metric 'Queries'"),
            ErrorClass::QuotaExceeded
        );
        assert_eq!(classify_error_message("Backend Error"), ErrorClass::Other);
    }

    #[test]
    fn test_rotates_key() {
        assert!(ErrorClass::KeyRejected.rotates_key());
        assert!(ErrorClass::QuotaExceeded.rotates_key());
        assert!(!ErrorClass::InvalidSearchEngine.rotates_key());
        assert!(!ErrorClass::Other.rotates_key());
    }
}
