//! Completion store: which tours the user has finished or dismissed.
//!
//! Two copies exist: a local cache read synchronously at startup so the first
//! render knows what was seen, and the remote set on the backend. They are
//! merged by union, so the order in which copies arrive never matters. The
//! only non-monotone operation is `clear`, which is last-writer-wins.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::registry::TourId;
use crate::api::TourSyncApi;
use crate::error::CacheError;

/// Local key-value copy of the completion set.
pub trait LocalCache: Send + Sync {
    fn read(&self) -> Result<Vec<String>, CacheError>;
    fn write(&self, ids: &[String]) -> Result<(), CacheError>;
    fn clear(&self) -> Result<(), CacheError>;
}

/// Completion set stored as a JSON array in a file.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    path: PathBuf,
}

impl JsonFileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LocalCache for JsonFileCache {
    fn read(&self) -> Result<Vec<String>, CacheError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, ids: &[String]) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec(ids)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process cache, for front-ends without storage and for tests.
#[derive(Debug, Default)]
pub struct MemoryCache {
    ids: Mutex<Vec<String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: Mutex::new(ids.into_iter().map(Into::into).collect()),
        }
    }
}

impl LocalCache for MemoryCache {
    fn read(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.ids.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn write(&self, ids: &[String]) -> Result<(), CacheError> {
        *self.ids.lock().unwrap_or_else(|e| e.into_inner()) = ids.to_vec();
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheError> {
        self.ids.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }
}

/// Dual-tier completion set.
pub struct CompletionStore {
    local: Arc<dyn LocalCache>,
    remote: Arc<dyn TourSyncApi>,
    seen: RwLock<BTreeSet<TourId>>,
    ready: watch::Sender<bool>,
}

impl CompletionStore {
    /// Create the store, reading the local cache immediately.
    ///
    /// The store reports not-ready until [`CompletionStore::load`] has
    /// consulted the remote copy.
    pub fn new(local: Arc<dyn LocalCache>, remote: Arc<dyn TourSyncApi>) -> Arc<Self> {
        let seen = read_local(local.as_ref());
        debug!(count = seen.len(), "Read completed tours from local cache");
        let (ready, _rx) = watch::channel(false);
        Arc::new(Self {
            local,
            remote,
            seen: RwLock::new(seen),
            ready,
        })
    }

    /// Merge local and remote copies into the in-memory set.
    ///
    /// The union is written back to the local cache. A failed remote fetch
    /// keeps the local result. The store is ready afterwards either way.
    pub async fn load(&self) -> BTreeSet<TourId> {
        let local = read_local(self.local.as_ref());
        let remote = match self.remote.fetch_seen_tours().await {
            Ok(ids) => parse_ids(ids),
            Err(e) => {
                warn!(error = %e, "Failed to fetch completed tours, using local copy");
                BTreeSet::new()
            }
        };

        let merged = {
            let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());
            seen.extend(local);
            seen.extend(remote);
            seen.clone()
        };
        write_local(self.local.as_ref(), &merged);
        self.ready.send_replace(true);

        info!(count = merged.len(), "Completed tours synced");
        merged
    }

    /// Run [`CompletionStore::load`] in the background.
    pub fn spawn_load(self: &Arc<Self>) -> JoinHandle<BTreeSet<TourId>> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.load().await })
    }

    /// Whether the initial load has settled.
    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until the initial load has settled.
    pub async fn wait_ready(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|ready| *ready).await;
    }

    pub fn contains(&self, id: TourId) -> bool {
        self.seen
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id)
    }

    pub fn snapshot(&self) -> BTreeSet<TourId> {
        self.seen.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Record a tour as seen. Local write is immediate; the remote write runs
    /// in the background and only logs on failure.
    pub fn mark_complete(&self, id: TourId) {
        let merged = {
            let mut seen = self.seen.write().unwrap_or_else(|e| e.into_inner());
            seen.insert(id);
            seen.clone()
        };
        write_local(self.local.as_ref(), &merged);

        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(e) = remote.mark_tour_seen(id.as_str()).await {
                warn!(tour_id = %id, error = %e, "Failed to record tour completion remotely");
            }
        });
    }

    /// Forget every completed tour, locally and remotely.
    pub fn clear(&self) {
        self.seen.write().unwrap_or_else(|e| e.into_inner()).clear();
        if let Err(e) = self.local.clear() {
            warn!(error = %e, "Failed to clear local tour cache");
        }

        let remote = Arc::clone(&self.remote);
        tokio::spawn(async move {
            if let Err(e) = remote.clear_seen_tours().await {
                warn!(error = %e, "Failed to clear completed tours remotely");
            }
        });
        info!("Completed tours cleared");
    }
}

fn parse_ids(raw: Vec<String>) -> BTreeSet<TourId> {
    raw.into_iter()
        .filter_map(|id| match id.parse::<TourId>() {
            Ok(id) => Some(id),
            Err(_) => {
                debug!(tour_id = %id, "Ignoring unknown tour id");
                None
            }
        })
        .collect()
}

fn read_local(cache: &dyn LocalCache) -> BTreeSet<TourId> {
    match cache.read() {
        Ok(ids) => parse_ids(ids),
        Err(e) => {
            warn!(error = %e, "Failed to read local tour cache");
            BTreeSet::new()
        }
    }
}

fn write_local(cache: &dyn LocalCache, seen: &BTreeSet<TourId>) {
    let ids: Vec<String> = seen.iter().map(|id| id.as_str().to_string()).collect();
    if let Err(e) = cache.write(&ids) {
        warn!(error = %e, "Failed to write local tour cache");
    }
}
