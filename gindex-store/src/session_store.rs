//! Session store: the results cache and everything a run hands back.
//!
//! A run takes a snapshot of the cache, works on it elsewhere and returns
//! it through [`SessionStore::complete_run`]. Only one run may be out at a
//! time across every process sharing the session file: [`SessionStore::begin_run`]
//! takes an advisory lock on `<session>.lock` and holds it until the run's
//! state is written back. The OS drops the lock if the process dies.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fslock::LockFile;
use gindex_core::{ApiKey, Domain, KeyPool, ResultCache};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{
    create_secure_parent_dir, default_session_path, load_json, load_json_or_default, save_json,
};

// ============================================================================
// Session State
// ============================================================================

/// Everything persisted between invocations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionState {
    /// Resolved domains in insertion order.
    pub results: ResultCache,
    /// Domains the last run could not process.
    pub pending: Vec<Domain>,
    /// Successful queries per key.
    pub key_usage: HashMap<ApiKey, u64>,
    /// When the last run finished.
    pub last_run: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Returns the cache with pending domains shown as quota markers.
    pub fn view(&self) -> ResultCache {
        self.results.with_pending(&self.pending)
    }
}

/// What a run starts from.
#[derive(Debug, Clone)]
pub struct RunTicket {
    /// Snapshot of the cache.
    pub cache: ResultCache,
    /// Usage counters to seed the key pool with.
    pub key_usage: HashMap<ApiKey, u64>,
}

// ============================================================================
// Session Store
// ============================================================================

/// Persistent session state with a single-run gate.
///
/// Every mutation reloads the file under the lock, applies the change and
/// writes it back before releasing, so concurrent invocations never lose
/// each other's results.
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    run_lock: Arc<Mutex<Option<LockFile>>>,
    path: PathBuf,
}

impl SessionStore {
    /// Creates an empty session backed by `path`.
    pub fn new(path: PathBuf) -> Self {
        Self::with_state(path, SessionState::default())
    }

    fn with_state(path: PathBuf, state: SessionState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            run_lock: Arc::new(Mutex::new(None)),
            path,
        }
    }

    /// Loads the session from the default path.
    pub async fn load_default() -> Self {
        Self::load(default_session_path()).await
    }

    /// Loads the session from `path`, starting empty if it is missing or bad.
    pub async fn load(path: PathBuf) -> Self {
        let state: SessionState = load_json_or_default(&path).await;
        debug!(
            path = %path.display(),
            results = state.results.len(),
            pending = state.pending.len(),
            "Session loaded"
        );
        Self::with_state(path, state)
    }

    /// Returns the backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the lock file guarding this session.
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Returns a copy of the state.
    pub async fn get(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Returns the cache with pending domains as quota markers.
    pub async fn view(&self) -> ResultCache {
        self.state.read().await.view()
    }

    /// Returns the usage counters.
    pub async fn key_usage(&self) -> HashMap<ApiKey, u64> {
        self.state.read().await.key_usage.clone()
    }

    async fn save(&self) -> Result<(), StoreError> {
        let state = self.state.read().await;
        save_json(&self.path, &*state).await?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    // ========================================================================
    // Locking
    // ========================================================================

    /// Takes the session lock without blocking.
    async fn acquire(&self) -> Result<LockFile, StoreError> {
        let path = self.lock_path();
        create_secure_parent_dir(&path).await?;

        let mut lock = LockFile::open(&path).map_err(|e| StoreError::Lock(e.to_string()))?;
        let acquired = lock.try_lock().map_err(|e| StoreError::Lock(e.to_string()))?;
        if !acquired {
            debug!(path = %path.display(), "Session locked by another run");
            return Err(StoreError::RunInProgress);
        }
        Ok(lock)
    }

    /// Picks up whatever another process saved since this store was loaded.
    async fn reload(&self) {
        match load_json::<SessionState>(&self.path).await {
            Ok(state) => *self.state.write().await = state,
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to reload session, keeping the loaded state"
                );
            }
        }
    }

    /// Applies `f` under the lock and saves.
    async fn exclusive<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut SessionState),
    {
        let slot = self.run_lock.lock().await;
        if slot.is_some() {
            return Err(StoreError::RunInProgress);
        }
        let lock = self.acquire().await?;
        self.reload().await;

        f(&mut *self.state.write().await);
        let saved = self.save().await;

        drop(lock);
        saved
    }

    // ========================================================================
    // Run Lifecycle
    // ========================================================================

    /// Marks a run as started and hands out its starting state.
    ///
    /// The state is reloaded from disk once the lock is held.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RunInProgress`] if a run is already out, here or
    /// in another process.
    pub async fn begin_run(&self) -> Result<RunTicket, StoreError> {
        let mut slot = self.run_lock.lock().await;
        if slot.is_some() {
            return Err(StoreError::RunInProgress);
        }
        let lock = self.acquire().await?;
        self.reload().await;
        *slot = Some(lock);

        let state = self.state.read().await;
        debug!(cached = state.results.len(), "Run started");
        Ok(RunTicket {
            cache: state.results.clone(),
            key_usage: state.key_usage.clone(),
        })
    }

    /// Takes back a finished run's cache, pool counters and unprocessed list,
    /// saves, and releases the run lock.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRunInProgress`] if no run was started, or an
    /// error if the session cannot be written.
    pub async fn complete_run(
        &self,
        cache: ResultCache,
        pool: &KeyPool,
        not_processed: Vec<Domain>,
    ) -> Result<(), StoreError> {
        self.finish(|state| {
            info!(
                results = cache.len(),
                not_processed = not_processed.len(),
                "Run completed"
            );
            state.results = cache;
            state.pending = not_processed;
            state.key_usage.extend(pool.usage_counts().iter().map(|(k, v)| (k.clone(), *v)));
            state.last_run = Some(Utc::now());
        })
        .await
    }

    /// Ends a run that aborted, saves, and releases the run lock. The cache
    /// and pending list stay as they were; usage counters from queries that
    /// did succeed are kept.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoRunInProgress`] if no run was started, or an
    /// error if the session cannot be written.
    pub async fn abort_run(&self, pool: &KeyPool) -> Result<(), StoreError> {
        self.finish(|state| {
            info!("Run aborted, cache unchanged");
            state.key_usage.extend(pool.usage_counts().iter().map(|(k, v)| (k.clone(), *v)));
        })
        .await
    }

    async fn finish<F>(&self, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut SessionState),
    {
        let mut slot = self.run_lock.lock().await;
        let Some(lock) = slot.take() else {
            return Err(StoreError::NoRunInProgress);
        };

        f(&mut *self.state.write().await);
        let saved = self.save().await;

        drop(lock);
        saved
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Empties the cache and the pending list, and saves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RunInProgress`] while a run is out.
    pub async fn clear_results(&self) -> Result<(), StoreError> {
        self.exclusive(|state| {
            info!(results = state.results.len(), "Clearing results");
            state.results.clear();
            state.pending.clear();
        })
        .await
    }

    /// Drops the usage counter of a removed key, and saves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RunInProgress`] while a run is out.
    pub async fn forget_key(&self, key: &str) -> Result<(), StoreError> {
        let key = key.trim();
        self.exclusive(|state| {
            state.key_usage.remove(key);
        })
        .await
    }
}
