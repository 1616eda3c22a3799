//! HTTP backend for the Custom Search JSON API.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;

/// Custom Search JSON API endpoint.
pub const CUSTOM_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

// ============================================================================
// Backend Trait
// ============================================================================

/// Status and body of one provider response, before interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl RawResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Something that can answer a search query.
///
/// The engine depends on this seam only, so tests can script responses
/// without a network.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Runs `query` against search engine `cx` using `key`.
    ///
    /// Only transport failures are errors; any HTTP status comes back as a
    /// [`RawResponse`].
    async fn search(&self, key: &str, cx: &str, query: &str) -> Result<RawResponse, FetchError>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// reqwest-backed [`SearchBackend`].
///
/// No request timeout is configured; the transport defaults apply.
#[derive(Debug, Clone)]
pub struct CseClient {
    inner: Client,
    endpoint: String,
}

impl CseClient {
    /// Creates a client for the public endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("gindexchecker/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: client,
            endpoint: CUSTOM_SEARCH_URL.to_string(),
        })
    }

    /// Points the client at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Returns the endpoint in use.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SearchBackend for CseClient {
    async fn search(&self, key: &str, cx: &str, query: &str) -> Result<RawResponse, FetchError> {
        debug!(endpoint = %self.endpoint, query = %query, "Making search request");

        let response = self
            .inner
            .get(&self.endpoint)
            .query(&[("key", key), ("cx", cx), ("q", query)])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        debug!(status, bytes = body.len(), "Search response received");
        Ok(RawResponse { status, body })
    }
}
