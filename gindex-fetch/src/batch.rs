//! Batch runner: looks up a list of domains against a shared key pool.
//!
//! Domains are queried one at a time in input order. Anything already in
//! the cache is skipped, so rerunning a batch only touches what is missing.
//! The run's results are merged into the cache once, at the end; a rejected
//! search engine id aborts before that merge and leaves the cache as it was.

use std::collections::{BTreeSet, HashSet};

use gindex_core::{ensure_configured, ApiKey, Domain, KeyPool, ResultCache, ResultEntry, SearchEngineId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::engine::{Outcome, QueryEngine, QueryFailure};
use crate::error::BatchError;

// ============================================================================
// Report
// ============================================================================

/// A domain whose lookup failed for a reason other than quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainFailure {
    /// The domain.
    pub domain: Domain,
    /// What went wrong.
    pub failure: QueryFailure,
}

/// Summary of a completed batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Entries resolved during this run, in query order.
    ///
    /// Failed lookups appear here with a count of 0.
    pub resolved: ResultCache,
    /// Domains left unqueried because every key was spent.
    pub not_processed: Vec<Domain>,
    /// Keys that answered at least one query.
    pub keys_used: BTreeSet<ApiKey>,
    /// Per-domain failures, in query order.
    pub failures: Vec<DomainFailure>,
    /// Domains skipped because they were already cached.
    pub skipped: usize,
    /// Requests that reached a final outcome.
    pub queried: usize,
}

impl BatchReport {
    /// Returns true if some domains were left for a later run.
    pub fn has_pending(&self) -> bool {
        !self.not_processed.is_empty()
    }
}

// ============================================================================
// Progress Events
// ============================================================================

/// Progress notifications from a running batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// The run started.
    Started {
        /// Number of input domains.
        total: usize,
    },
    /// Already cached; not queried.
    Skipped {
        /// The domain.
        domain: Domain,
    },
    /// Count obtained.
    Resolved {
        /// The domain.
        domain: Domain,
        /// Indexed page count.
        count: u64,
    },
    /// Lookup failed; recorded as 0.
    Failed {
        /// The domain.
        domain: Domain,
        /// Failure description.
        message: String,
    },
    /// The pool cursor moved during a lookup.
    KeysRotated {
        /// Index before the lookup.
        from: usize,
        /// Index after the lookup.
        to: usize,
    },
    /// Left for a later run.
    NotProcessed {
        /// The domain.
        domain: Domain,
    },
    /// The run finished without aborting.
    Finished {
        /// Domains resolved this run.
        resolved: usize,
        /// Domains left unprocessed.
        not_processed: usize,
    },
}

type EventSender = mpsc::UnboundedSender<BatchEvent>;

fn emit(events: Option<&EventSender>, event: BatchEvent) {
    if let Some(tx) = events {
        // Receiver may have gone away; the run carries on regardless.
        let _ = tx.send(event);
    }
}

// ============================================================================
// Batch Runner
// ============================================================================

/// Runs lookups for many domains with one search engine id.
#[derive(Clone)]
pub struct BatchRunner {
    engine: QueryEngine,
    cx: SearchEngineId,
}

impl BatchRunner {
    /// Creates a runner.
    pub fn new(engine: QueryEngine, cx: SearchEngineId) -> Self {
        Self { engine, cx }
    }

    /// Returns the search engine id.
    pub fn search_engine_id(&self) -> &SearchEngineId {
        &self.cx
    }

    /// Runs the batch in place.
    ///
    /// The pool cursor is rewound before the first query. On success the
    /// run's entries have been merged into `cache`.
    ///
    /// # Errors
    ///
    /// [`BatchError::ConfigurationMissing`] if keys or cx are absent (no
    /// query is made), [`BatchError::InvalidSearchEngine`] if the provider
    /// rejects the cx (the cache is left untouched).
    pub async fn run(
        &self,
        domains: &[Domain],
        cache: &mut ResultCache,
        pool: &mut KeyPool,
    ) -> Result<BatchReport, BatchError> {
        self.execute(domains, cache, pool, None).await
    }

    /// Runs the batch on a background task.
    ///
    /// The task takes ownership of `cache` and `pool` and hands them back
    /// through [`BatchHandle::join`].
    pub fn spawn(self, domains: Vec<Domain>, mut cache: ResultCache, mut pool: KeyPool) -> BatchHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let result = self.execute(&domains, &mut cache, &mut pool, Some(&tx)).await;
            BatchCompletion { cache, pool, result }
        });
        BatchHandle { events: rx, task }
    }

    #[instrument(skip_all, fields(domains = domains.len(), keys = pool.len()))]
    async fn execute(
        &self,
        domains: &[Domain],
        cache: &mut ResultCache,
        pool: &mut KeyPool,
        events: Option<&EventSender>,
    ) -> Result<BatchReport, BatchError> {
        ensure_configured(pool, &self.cx)?;
        pool.reset();

        info!(domains = domains.len(), cached = cache.len(), "Starting batch");
        emit(events, BatchEvent::Started { total: domains.len() });

        let mut report = BatchReport::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(domains.len());
        let mut exhausted = false;

        for domain in domains {
            if !seen.insert(domain.as_str()) {
                continue;
            }

            if cache.contains(domain) {
                debug!(domain = %domain, "Already cached, skipping");
                report.skipped += 1;
                emit(events, BatchEvent::Skipped { domain: domain.clone() });
                continue;
            }

            if exhausted {
                report.not_processed.push(domain.clone());
                emit(events, BatchEvent::NotProcessed { domain: domain.clone() });
                continue;
            }

            let before = pool.current_index();
            let outcome = self.engine.lookup(domain, pool, &self.cx).await;
            let after = pool.current_index();
            if after != before {
                emit(events, BatchEvent::KeysRotated { from: before, to: after });
            }

            match outcome {
                Outcome::Resolved { count, key } => {
                    report.queried += 1;
                    report.resolved.insert(domain.clone(), ResultEntry::Count(count));
                    report.keys_used.insert(key);
                    emit(
                        events,
                        BatchEvent::Resolved {
                            domain: domain.clone(),
                            count,
                        },
                    );
                }
                Outcome::Failed(failure) => {
                    report.queried += 1;
                    warn!(domain = %domain, error = %failure, "Lookup failed, recording 0");
                    report.resolved.insert(domain.clone(), ResultEntry::Count(0));
                    emit(
                        events,
                        BatchEvent::Failed {
                            domain: domain.clone(),
                            message: failure.to_string(),
                        },
                    );
                    report.failures.push(DomainFailure {
                        domain: domain.clone(),
                        failure,
                    });
                }
                Outcome::Exhausted => {
                    info!(domain = %domain, "All API keys spent");
                    exhausted = true;
                    report.not_processed.push(domain.clone());
                    emit(events, BatchEvent::NotProcessed { domain: domain.clone() });
                }
                Outcome::InvalidSearchEngine { message } => {
                    warn!(domain = %domain, "Aborting batch, search engine id rejected");
                    return Err(BatchError::InvalidSearchEngine {
                        domain: domain.clone(),
                        message,
                    });
                }
            }
        }

        let added = cache.merge(report.resolved.clone());
        info!(
            added,
            not_processed = report.not_processed.len(),
            keys_used = report.keys_used.len(),
            "Batch finished"
        );
        emit(
            events,
            BatchEvent::Finished {
                resolved: report.resolved.len(),
                not_processed: report.not_processed.len(),
            },
        );

        Ok(report)
    }
}

// ============================================================================
// Background Handle
// ============================================================================

/// State handed back by a background run.
#[derive(Debug)]
pub struct BatchCompletion {
    /// The cache, merged with this run's results unless the run aborted.
    pub cache: ResultCache,
    /// The pool, with updated usage counters.
    pub pool: KeyPool,
    /// The run's outcome.
    pub result: Result<BatchReport, BatchError>,
}

/// Handle to a batch running on a background task.
pub struct BatchHandle {
    events: mpsc::UnboundedReceiver<BatchEvent>,
    task: JoinHandle<BatchCompletion>,
}

impl BatchHandle {
    /// Waits for the next progress event. `None` once the run is over.
    pub async fn next_event(&mut self) -> Option<BatchEvent> {
        self.events.recv().await
    }

    /// Waits for the run to finish and takes back its state.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError::TaskFailed`] if the task panicked.
    pub async fn join(self) -> Result<BatchCompletion, BatchError> {
        Ok(self.task.await?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{error_400, ok_count, status_only, ScriptedBackend};
    use gindex_core::{MissingConfig, Tier};
    use std::sync::Arc;

    fn runner(backend: Arc<ScriptedBackend>) -> BatchRunner {
        BatchRunner::new(QueryEngine::new(backend), SearchEngineId::new("cx-1"))
    }

    fn domains(list: &[&str]) -> Vec<Domain> {
        list.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_rotation_scenario() {
        let backend = ScriptedBackend::new(|key, _, _| {
            Ok(if key == "key1" { status_only(429) } else { ok_count(7) })
        });
        let mut cache = ResultCache::new();
        let mut pool = KeyPool::new(["key1", "key2"]);

        let report = runner(backend)
            .run(&domains(&["a.com"]), &mut cache, &mut pool)
            .await
            .unwrap();

        assert_eq!(report.keys_used, BTreeSet::from(["key2".to_string()]));
        assert!(report.not_processed.is_empty());
        assert_eq!(cache.get("a.com"), Some(ResultEntry::Count(7)));
        assert_eq!(cache.get("a.com").unwrap().tier(), Tier::Yellow);
    }

    #[tokio::test]
    async fn test_invalid_cx_aborts_and_leaves_cache() {
        let backend = ScriptedBackend::new(|_, _, _| {
            Ok(error_400("Request contains an invalid argument."))
        });
        let mut cache = ResultCache::new();
        cache.insert("old.com", ResultEntry::Count(3));
        let mut pool = KeyPool::new(["k1"]);

        let err = runner(backend.clone())
            .run(&domains(&["a.com", "b.com"]), &mut cache, &mut pool)
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::InvalidSearchEngine { .. }));
        assert_eq!(backend.call_count(), 1);
        assert_eq!(cache.len(), 1);
        assert!(!cache.contains("a.com"));
    }

    #[tokio::test]
    async fn test_invalid_cx_mid_run_discards_earlier_results() {
        let backend = ScriptedBackend::new(|_, _, q| {
            Ok(if q == "site:a.com" {
                ok_count(5)
            } else {
                error_400("Request contains an invalid argument.")
            })
        });
        let mut cache = ResultCache::new();
        let mut pool = KeyPool::new(["k1"]);

        let result = runner(backend)
            .run(&domains(&["a.com", "b.com"]), &mut cache, &mut pool)
            .await;

        assert!(matches!(result, Err(BatchError::InvalidSearchEngine { ref domain, .. }) if domain == "b.com"));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_missing_keys_blocks_before_query() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(1)));
        let mut cache = ResultCache::new();
        let mut pool = KeyPool::default();

        let err = runner(backend.clone())
            .run(&domains(&["a.com"]), &mut cache, &mut pool)
            .await
            .unwrap_err();

        assert!(matches!(err, BatchError::ConfigurationMissing(MissingConfig::ApiKeys)));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_cx_blocks_before_query() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(1)));
        let runner = BatchRunner::new(QueryEngine::new(backend.clone()), SearchEngineId::new("  "));

        let err = runner
            .run(&domains(&["a.com"]), &mut ResultCache::new(), &mut KeyPool::new(["k1"]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BatchError::ConfigurationMissing(MissingConfig::SearchEngineId)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cached_domains_are_skipped_and_rerun_is_idempotent() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(12)));
        let mut cache = ResultCache::new();
        cache.insert("a.com", ResultEntry::Count(1));
        let mut pool = KeyPool::new(["k1"]);
        let runner = runner(backend.clone());
        let input = domains(&["a.com", "b.com"]);

        let first = runner.run(&input, &mut cache, &mut pool).await.unwrap();
        assert_eq!(first.skipped, 1);
        assert_eq!(backend.call_count(), 1);
        assert!(!backend.queried("site:a.com"));

        let second = runner.run(&input, &mut cache, &mut pool).await.unwrap();
        assert_eq!(second.skipped, 2);
        assert_eq!(second.queried, 0);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(cache.get("a.com"), Some(ResultEntry::Count(1)));
        assert_eq!(cache.get("b.com"), Some(ResultEntry::Count(12)));
    }

    #[tokio::test]
    async fn test_exhaustion_leaves_rest_unprocessed() {
        let backend = ScriptedBackend::new(|_, _, q| {
            Ok(if q == "site:a.com" { ok_count(2) } else { status_only(429) })
        });
        let mut cache = ResultCache::new();
        let mut pool = KeyPool::new(["k1"]);

        let report = runner(backend.clone())
            .run(&domains(&["a.com", "b.com", "c.com"]), &mut cache, &mut pool)
            .await
            .unwrap();

        assert_eq!(report.not_processed, domains(&["b.com", "c.com"]));
        assert!(report.has_pending());
        // c.com is short-circuited without a request.
        assert_eq!(backend.call_count(), 2);
        assert_eq!(cache.len(), 1);
        assert!(pool.is_exhausted());
    }

    #[tokio::test]
    async fn test_next_run_rewinds_pool() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(4)));
        let mut pool = KeyPool::new(["k1", "k2"]);
        pool.advance();
        pool.advance();

        let report = runner(backend)
            .run(&domains(&["a.com"]), &mut ResultCache::new(), &mut pool)
            .await
            .unwrap();

        assert_eq!(report.keys_used, BTreeSet::from(["k1".to_string()]));
        assert_eq!(pool.usage("k1"), 1);
    }

    #[tokio::test]
    async fn test_failed_lookup_recorded_as_zero() {
        let backend = ScriptedBackend::new(|_, _, q| {
            Ok(if q == "site:a.com" { status_only(503) } else { ok_count(9) })
        });
        let mut cache = ResultCache::new();
        let mut pool = KeyPool::new(["k1"]);

        let report = runner(backend)
            .run(&domains(&["a.com", "b.com"]), &mut cache, &mut pool)
            .await
            .unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].domain, "a.com");
        assert_eq!(cache.get("a.com"), Some(ResultEntry::Count(0)));
        assert_eq!(cache.get("b.com"), Some(ResultEntry::Count(9)));
        assert_eq!(pool.usage("k1"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_input_queried_once() {
        let backend = ScriptedBackend::new(|_, _, _| Ok(ok_count(1)));
        let mut cache = ResultCache::new();

        runner(backend.clone())
            .run(&domains(&["a.com", "a.com"]), &mut cache, &mut KeyPool::new(["k1"]))
            .await
            .unwrap();

        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_spawn_streams_events_and_returns_state() {
        let backend = ScriptedBackend::new(|key, _, _| {
            Ok(if key == "k1" { status_only(429) } else { ok_count(20) })
        });
        let mut cache = ResultCache::new();
        cache.insert("cached.com", ResultEntry::Count(2));

        let mut handle = runner(backend).spawn(
            domains(&["cached.com", "new.com"]),
            cache,
            KeyPool::new(["k1", "k2"]),
        );

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }
        let completion = handle.join().await.unwrap();

        assert_eq!(
            events,
            vec![
                BatchEvent::Started { total: 2 },
                BatchEvent::Skipped {
                    domain: "cached.com".into()
                },
                BatchEvent::KeysRotated { from: 0, to: 1 },
                BatchEvent::Resolved {
                    domain: "new.com".into(),
                    count: 20
                },
                BatchEvent::Finished {
                    resolved: 1,
                    not_processed: 0
                },
            ]
        );
        assert!(completion.result.is_ok());
        assert_eq!(completion.cache.len(), 2);
        assert_eq!(completion.pool.usage("k2"), 1);
    }
}
