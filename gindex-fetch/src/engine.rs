//! Single-domain lookup with key rotation.
//!
//! [`QueryEngine::lookup`] walks the key pool from its current position.
//! Rate limits and rejected keys move the cursor forward; a rejected cx
//! stops everything; anything unexpected fails just this domain.

use std::sync::Arc;

use gindex_core::{mask_key, ApiKey, KeyPool, SearchEngineId};
use tracing::{debug, info, instrument, warn};

use crate::api::{classify_error_message, parse_error_message, parse_total_results, ErrorClass};
use crate::client::SearchBackend;

const STATUS_OK: u16 = 200;
const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_TOO_MANY_REQUESTS: u16 = 429;

// ============================================================================
// Outcome
// ============================================================================

/// Why a single domain could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFailure {
    /// The provider returned a structured error we do not recognise.
    Provider {
        /// HTTP status.
        status: u16,
        /// Provider message.
        message: String,
    },
    /// Unexpected status or unreadable error payload.
    Unexpected {
        /// HTTP status.
        status: u16,
        /// Raw body.
        body: String,
    },
    /// The request never got a response.
    Transport(String),
}

impl std::fmt::Display for QueryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Provider { status, message } => write!(f, "{status}: {message}"),
            Self::Unexpected { status, body } => write!(f, "unexpected status {status}: {body}"),
            Self::Transport(e) => write!(f, "request failed: {e}"),
        }
    }
}

/// Result of looking up one domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The count was obtained with `key`.
    Resolved {
        /// Indexed page count.
        count: u64,
        /// Key that answered.
        key: ApiKey,
    },
    /// Every remaining key was rate limited or rejected.
    Exhausted,
    /// The provider rejected the cx.
    InvalidSearchEngine {
        /// Provider message.
        message: String,
    },
    /// Non-retryable failure for this domain only.
    Failed(QueryFailure),
}

// ============================================================================
// Query Engine
// ============================================================================

/// Looks up indexed counts, rotating through a [`KeyPool`].
#[derive(Clone)]
pub struct QueryEngine {
    backend: Arc<dyn SearchBackend>,
}

impl QueryEngine {
    /// Creates an engine over `backend`.
    pub fn new(backend: Arc<dyn SearchBackend>) -> Self {
        Self { backend }
    }

    /// Looks up the `site:` count for `domain`.
    ///
    /// Starts at the pool's current key and never moves the cursor back.
    #[instrument(skip(self, pool, cx), fields(domain = %domain))]
    pub async fn lookup(&self, domain: &str, pool: &mut KeyPool, cx: &SearchEngineId) -> Outcome {
        let query = format!("site:{domain}");

        while let Some(key) = pool.current_key().map(str::to_string) {
            let index = pool.current_index();
            debug!(key = %mask_key(&key), key_index = index, "Querying");

            let response = match self.backend.search(&key, cx.as_str(), &query).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(error = %e, "Search request failed");
                    return Outcome::Failed(QueryFailure::Transport(e.to_string()));
                }
            };

            match response.status {
                STATUS_OK => {
                    let count = parse_total_results(&response.body);
                    pool.record_use(&key);
                    debug!(count, "Resolved");
                    return Outcome::Resolved { count, key };
                }
                STATUS_TOO_MANY_REQUESTS => {
                    info!(key = %mask_key(&key), key_index = index, "Rate limited, rotating key");
                    pool.advance();
                }
                STATUS_BAD_REQUEST => {
                    let Some(message) = parse_error_message(&response.body) else {
                        warn!(status = response.status, "Unreadable error payload");
                        return Outcome::Failed(QueryFailure::Unexpected {
                            status: response.status,
                            body: response.body,
                        });
                    };

                    match classify_error_message(&message) {
                        ErrorClass::InvalidSearchEngine => {
                            warn!(message = %message, "Search engine id rejected");
                            return Outcome::InvalidSearchEngine { message };
                        }
                        class if class.rotates_key() => {
                            info!(
                                key = %mask_key(&key),
                                key_index = index,
                                reason = ?class,
                                "Key unusable, rotating"
                            );
                            pool.advance();
                        }
                        _ => {
                            warn!(message = %message, "Provider error");
                            return Outcome::Failed(QueryFailure::Provider {
                                status: response.status,
                                message,
                            });
                        }
                    }
                }
                status => {
                    warn!(status, "Unexpected response status");
                    return Outcome::Failed(QueryFailure::Unexpected {
                        status,
                        body: response.body,
                    });
                }
            }
        }

        debug!("Key pool exhausted");
        Outcome::Exhausted
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{error_400, ok_count, raw, status_only, ScriptedBackend};
    use crate::FetchError;

    fn cx() -> SearchEngineId {
        SearchEngineId::new("cx-123")
    }

    #[tokio::test]
    async fn test_resolves_and_records_use() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(42)));
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["k1"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert_eq!(outcome, Outcome::Resolved { count: 42, key: "k1".into() });
        assert_eq!(pool.usage("k1"), 1);
        assert_eq!(backend.calls()[0].query, "site:a.com");
        assert_eq!(backend.calls()[0].cx, "cx-123");
    }

    #[tokio::test]
    async fn test_rate_limit_rotates_to_next_key() {
        let backend = ScriptedBackend::new(|key, _, _| {
            Ok(if key == "k1" { status_only(429) } else { ok_count(7) })
        });
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["k1", "k2"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert_eq!(outcome, Outcome::Resolved { count: 7, key: "k2".into() });
        assert_eq!(pool.current_index(), 1);
        assert_eq!(pool.usage("k1"), 0);
        assert_eq!(pool.usage("k2"), 1);
        assert_eq!(backend.call_count(), 2);
    }

    #[tokio::test]
    async fn test_rejected_and_quota_keys_rotate() {
        let backend = ScriptedBackend::new(|key, _, _| {
            Ok(match key {
                "bad" => error_400("API key not valid. Please pass a valid API key."),
                "gone" => error_400("API Key not found. Please pass a valid API key."),
                "spent" => error_400("Quota exceeded for quota metric 'Queries per day'"),
                _ => ok_count(3),
            })
        });
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["bad", "gone", "spent", "good"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert_eq!(outcome, Outcome::Resolved { count: 3, key: "good".into() });
        assert_eq!(pool.current_index(), 3);
    }

    #[tokio::test]
    async fn test_all_keys_limited_is_exhausted() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(status_only(429)));
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["k1", "k2", "k3"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert_eq!(outcome, Outcome::Exhausted);
        assert!(pool.is_exhausted());
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_pool_makes_no_request() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(1)));
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["k1"]);
        pool.advance();

        assert_eq!(engine.lookup("a.com", &mut pool, &cx()).await, Outcome::Exhausted);
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_cx_stops_without_rotating() {
        let backend = ScriptedBackend::new(|_, _, _| {
            Ok(error_400("Request contains an invalid argument."))
        });
        let engine = QueryEngine::new(backend.clone());
        let mut pool = KeyPool::new(["k1", "k2"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert!(matches!(outcome, Outcome::InvalidSearchEngine { .. }));
        assert_eq!(pool.current_index(), 0);
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_400_fails_domain() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(error_400("Something odd")));
        let engine = QueryEngine::new(backend);
        let mut pool = KeyPool::new(["k1", "k2"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert_eq!(
            outcome,
            Outcome::Failed(QueryFailure::Provider {
                status: 400,
                message: "Something odd".into()
            })
        );
        assert_eq!(pool.current_index(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_400_and_other_status_fail_domain() {
        let backend = ScriptedBackend::new(|_, _, q| {
            Ok(if q.contains("html") {
                raw(400, "<html>Bad Request</html>")
            } else {
                status_only(500)
            })
        });
        let engine = QueryEngine::new(backend);
        let mut pool = KeyPool::new(["k1"]);

        assert!(matches!(
            engine.lookup("html.com", &mut pool, &cx()).await,
            Outcome::Failed(QueryFailure::Unexpected { status: 400, .. })
        ));
        assert!(matches!(
            engine.lookup("x.com", &mut pool, &cx()).await,
            Outcome::Failed(QueryFailure::Unexpected { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_transport_error_fails_domain() {
        let backend = ScriptedBackend::new(|_, _, _| {
            Err(FetchError::InvalidResponse("connection reset".into()))
        });
        let engine = QueryEngine::new(backend);
        let mut pool = KeyPool::new(["k1", "k2"]);

        let outcome = engine.lookup("a.com", &mut pool, &cx()).await;

        assert!(matches!(outcome, Outcome::Failed(QueryFailure::Transport(_))));
        assert_eq!(pool.current_index(), 0);
    }
}
