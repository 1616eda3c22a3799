//! Integration tests for batch runs over a mock search backend.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gindex_core::{KeyPool, ResultCache, ResultEntry, SearchEngineId, Tier};
use gindex_fetch::{
    BatchError, BatchEvent, BatchRunner, FetchError, KeyStatus, KeyVerifier, QueryEngine,
    RawResponse, SearchBackend,
};

/// Backend with a fixed count per domain and a daily budget per key.
struct QuotaBackend {
    counts: HashMap<String, u64>,
    budget: Mutex<HashMap<String, u32>>,
    requests: Mutex<u32>,
}

impl QuotaBackend {
    fn new(counts: &[(&str, u64)], budget: &[(&str, u32)]) -> Arc<Self> {
        Arc::new(Self {
            counts: counts.iter().map(|(d, c)| (format!("site:{d}"), *c)).collect(),
            budget: Mutex::new(budget.iter().map(|(k, b)| ((*k).to_string(), *b)).collect()),
            requests: Mutex::new(0),
        })
    }

    fn requests(&self) -> u32 {
        *self.requests.lock().unwrap()
    }
}

#[async_trait]
impl SearchBackend for QuotaBackend {
    async fn search(&self, key: &str, cx: &str, query: &str) -> Result<RawResponse, FetchError> {
        *self.requests.lock().unwrap() += 1;

        if cx == "invalid_cx_placeholder" {
            return Ok(RawResponse::new(
                400,
                r#"{"error":{"errors":[{"message":"Request contains an invalid argument."}]}}"#,
            ));
        }

        let mut budget = self.budget.lock().unwrap();
        let Some(left) = budget.get_mut(key) else {
            return Ok(RawResponse::new(
                400,
                r#"{"error":{"errors":[{"message":"API key not valid. Please pass a valid API key."}]}}"#,
            ));
        };
        if *left == 0 {
            return Ok(RawResponse::new(429, ""));
        }
        *left -= 1;

        let count = self.counts.get(query).copied().unwrap_or(0);
        Ok(RawResponse::new(
            200,
            format!(r#"{{"searchInformation":{{"totalResults":"{count}"}}}}"#),
        ))
    }
}

fn domains(list: &[&str]) -> Vec<String> {
    list.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn test_session_spans_quota_exhaustion_and_resume() {
    let backend = QuotaBackend::new(
        &[("a.com", 50), ("b.com", 8), ("c.com", 3), ("d.com", 0)],
        &[("bogus", 5), ("k1", 1), ("k2", 1)],
    );
    let runner = BatchRunner::new(QueryEngine::new(backend.clone()), SearchEngineId::new("cx"));
    let input = domains(&["a.com", "b.com", "c.com", "d.com"]);
    let mut cache = ResultCache::new();
    let mut pool = KeyPool::new(["k1", "k2"]);

    let first = runner.run(&input, &mut cache, &mut pool).await.unwrap();
    assert_eq!(first.not_processed, domains(&["c.com", "d.com"]));
    assert_eq!(
        first.keys_used,
        BTreeSet::from(["k1".to_string(), "k2".to_string()])
    );

    let view = cache.with_pending(&first.not_processed);
    assert_eq!(view.get("c.com"), Some(ResultEntry::QuotaExceeded));
    assert!(!cache.contains("c.com"));

    // Quota resets overnight.
    backend.budget.lock().unwrap().insert("k1".into(), 10);
    let before = backend.requests();

    let second = runner.run(&input, &mut cache, &mut pool).await.unwrap();
    assert!(second.not_processed.is_empty());
    assert_eq!(second.skipped, 2);
    assert_eq!(backend.requests() - before, 2);

    let buckets = cache.buckets();
    assert_eq!(buckets.get(Tier::Green).to_vec(), domains(&["a.com"]));
    assert_eq!(buckets.get(Tier::Yellow).to_vec(), domains(&["b.com"]));
    assert_eq!(buckets.get(Tier::Orange).to_vec(), domains(&["c.com"]));
    assert_eq!(buckets.get(Tier::None).to_vec(), domains(&["d.com"]));
    assert_eq!(buckets.copy_all(), domains(&["a.com", "b.com", "c.com"]));
    assert_eq!(pool.usage("k1"), 3);
}

#[tokio::test]
async fn test_rejected_key_is_skipped() {
    let backend = QuotaBackend::new(&[("a.com", 11)], &[("good", 3)]);
    let runner = BatchRunner::new(QueryEngine::new(backend), SearchEngineId::new("cx"));
    let mut cache = ResultCache::new();
    let mut pool = KeyPool::new(["typo", "good"]);

    let report = runner.run(&domains(&["a.com"]), &mut cache, &mut pool).await.unwrap();

    assert_eq!(report.keys_used, BTreeSet::from(["good".to_string()]));
    assert_eq!(cache.get("a.com").map(|e| e.tier()), Some(Tier::Green));
}

#[tokio::test]
async fn test_background_run_reports_exhaustion() {
    let backend = QuotaBackend::new(&[("a.com", 1)], &[("k1", 0)]);
    let runner = BatchRunner::new(QueryEngine::new(backend), SearchEngineId::new("cx"));

    let mut handle = runner.spawn(domains(&["a.com", "b.com"]), ResultCache::new(), KeyPool::new(["k1"]));
    let mut not_processed = Vec::new();
    while let Some(event) = handle.next_event().await {
        if let BatchEvent::NotProcessed { domain } = event {
            not_processed.push(domain);
        }
    }
    let completion = handle.join().await.unwrap();

    assert_eq!(not_processed, domains(&["a.com", "b.com"]));
    assert!(completion.cache.is_empty());
    assert!(completion.pool.is_exhausted());
}

#[tokio::test]
async fn test_missing_configuration_reported_before_spawn_work() {
    let backend = QuotaBackend::new(&[], &[]);
    let runner = BatchRunner::new(QueryEngine::new(backend.clone()), SearchEngineId::new(""));

    let completion = runner
        .spawn(domains(&["a.com"]), ResultCache::new(), KeyPool::default())
        .join()
        .await
        .unwrap();

    assert!(matches!(completion.result, Err(BatchError::ConfigurationMissing(_))));
    assert_eq!(backend.requests(), 0);
}

#[tokio::test]
async fn test_verifier_against_mock() {
    let backend = QuotaBackend::new(&[], &[("k1", 1)]);
    let verifier = KeyVerifier::new(backend);

    let results = verifier.verify_all(&domains(&["k1"])).await;

    assert_eq!(results[0].status, KeyStatus::Valid);
}
