//! # Freshness Cache
//!
//! Owns the decoded row set. `get_rows` answers from memory, then from the
//! persisted snapshot, and only then from the upstream, as long as the
//! answer is younger than the freshness window (24h by default).
//!
//! ## Contained Modules:
//!
//! - **`clock`**: wall-clock abstraction, real and manual.
//! - **`single_flight`**: registry that collapses concurrent loads of one source.
//! - **`store`**: the atomically replaced JSON snapshot file.
//!
//! Failure policy:
//! - an unreadable snapshot is a cold cache;
//! - a failed snapshot write is logged, the fresh rows are still returned;
//! - a failed fetch is returned as [`RatioError::SourceUnavailable`], with no
//!   stale-data fallback.
//!
//! Loads run as their own tasks, so a load keeps going and persists its rows
//! after every waiting caller has given up.

#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::error::{RatioError, RatioResult};
use crate::model::Row;
use crate::sources::owid::decode_rows;
use crate::sources::UpstreamFetcher;

/// Wall-clock abstraction.
pub mod clock;
/// Single-flight registry.
pub mod single_flight;
/// Persisted snapshot file.
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use single_flight::SingleFlight;
pub use store::{PersistedSnapshot, SnapshotStore};

/// # Cache Entry
///
/// An immutable snapshot: the rows and when they were fetched. Replaced
/// wholesale, never edited.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Decoded rows, in upstream file order.
    pub rows: Arc<Vec<Row>>,
    /// Fetch time, ms since epoch.
    pub timestamp: i64,
}

impl CacheEntry {
    /// True when `now - timestamp` is within `[0, window)`. A timestamp in the
    /// future is treated as stale.
    pub fn is_fresh(&self, now_ms: i64, window: Duration) -> bool {
        let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
        let age = now_ms.saturating_sub(self.timestamp);
        (0..window_ms).contains(&age)
    }
}

type Loaded = RatioResult<Arc<Vec<Row>>>;

struct Inner {
    fetcher: Arc<dyn UpstreamFetcher>,
    store: SnapshotStore,
    clock: Arc<dyn Clock>,
    window: Duration,
    memory: Mutex<HashMap<String, CacheEntry>>,
    // Bumped by `invalidate`; a load that started under an older value
    // neither remembers nor persists its rows.
    generation: AtomicU64,
}

/// # Freshness Cache
///
/// Cheap to clone; clones share the same memory snapshot and in-flight
/// registry.
#[derive(Clone)]
pub struct FreshnessCache {
    inner: Arc<Inner>,
    flights: SingleFlight<Loaded>,
}

impl FreshnessCache {
    /// Builds a cache over `fetcher`, persisting to `store`.
    pub fn new(
        fetcher: Arc<dyn UpstreamFetcher>,
        store: SnapshotStore,
        clock: Arc<dyn Clock>,
        window: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                store,
                clock,
                window,
                memory: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
            flights: SingleFlight::new(),
        }
    }

    /// The freshness window in use.
    pub fn window(&self) -> Duration {
        self.inner.window
    }

    /// Returns the rows of `source`, fetching them only when no fresh
    /// snapshot exists. Concurrent calls for the same source share one load.
    ///
    /// # Errors
    /// `RatioError::SourceUnavailable` when a fetch was needed and failed,
    /// `RatioError::LoadFailed` when the load task panicked.
    pub async fn get_rows(&self, source: &str) -> Loaded {
        if let Some(rows) = self.inner.fresh_in_memory(source) {
            debug!(source, "Using cached data (memory)");
            return Ok(rows);
        }

        let inner = Arc::clone(&self.inner);
        let owned = source.to_string();
        self.flights
            .run(source, move || async move { inner.load(&owned).await })
            .await
            .unwrap_or_else(|reason| {
                error!(source, reason = %reason, "Load task failed");
                Err(RatioError::LoadFailed(reason))
            })
    }

    /// Drops the snapshot of `source` from memory and deletes the persisted
    /// file so that the next call fetches. A load already in flight still
    /// answers its waiters but keeps its rows to itself.
    pub async fn invalidate(&self, source: &str) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner
            .memory
            .lock()
            .expect("cache memory lock poisoned")
            .remove(source);

        match self.inner.store.remove().await {
            Ok(()) => info!(source, path = %self.inner.store.path().display(), "Cache invalidated"),
            Err(e) => warn!(source, error = %e, "Could not delete cache file during invalidation"),
        }
    }
}

impl Inner {
    fn fresh_in_memory(&self, source: &str) -> Option<Arc<Vec<Row>>> {
        let now = self.clock.now_ms();
        let memory = self.memory.lock().expect("cache memory lock poisoned");
        memory
            .get(source)
            .filter(|entry| entry.is_fresh(now, self.window))
            .map(|entry| Arc::clone(&entry.rows))
    }

    fn remember(&self, source: &str, entry: CacheEntry) {
        self.memory
            .lock()
            .expect("cache memory lock poisoned")
            .insert(source.to_string(), entry);
    }

    fn superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }

    async fn load(&self, source: &str) -> Loaded {
        let generation = self.generation.load(Ordering::SeqCst);

        // A flight that just finished may have filled memory between our
        // first check and registering this one.
        if let Some(rows) = self.fresh_in_memory(source) {
            return Ok(rows);
        }

        if let Some(entry) = self.load_persisted(source).await {
            let rows = Arc::clone(&entry.rows);
            let age_secs = (self.clock.now_ms() - entry.timestamp) / 1000;
            info!(source, rows = rows.len(), age_secs, "Using cached data");
            if !self.superseded(generation) {
                self.remember(source, entry);
            }
            return Ok(rows);
        }

        let text = match self.fetcher.fetch_text(source).await {
            Ok(text) => text,
            Err(e) => {
                error!(source, error = %e, "Upstream fetch failed");
                return Err(RatioError::SourceUnavailable(e));
            }
        };

        let rows = Arc::new(decode_rows(&text));
        let entry = CacheEntry {
            rows: Arc::clone(&rows),
            timestamp: self.clock.now_ms(),
        };

        info!(source, rows = rows.len(), "Fetched fresh data");
        if self.superseded(generation) {
            info!(source, "Cache invalidated during fetch; rows not kept");
            return Ok(rows);
        }

        let snapshot = PersistedSnapshot {
            data: rows.as_ref().clone(),
            timestamp: entry.timestamp,
            source: Some(source.to_string()),
        };
        if let Err(e) = self.store.save(&snapshot).await {
            warn!(source, path = %self.store.path().display(), error = %e, "Could not persist cache file");
        }

        self.remember(source, entry);
        Ok(rows)
    }

    async fn load_persisted(&self, source: &str) -> Option<CacheEntry> {
        let snapshot = match self.store.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(source, path = %self.store.path().display(), "No cache file");
                return None;
            }
            Err(e) => {
                warn!(source, error = %e, "Cache file unreadable; treating as cold");
                return None;
            }
        };

        if !snapshot.matches(source) {
            debug!(source, cached = ?snapshot.source, "Cache file belongs to another source");
            return None;
        }

        let entry = CacheEntry {
            rows: Arc::new(snapshot.data),
            timestamp: snapshot.timestamp,
        };
        if entry.is_fresh(self.clock.now_ms(), self.window) {
            Some(entry)
        } else {
            debug!(source, timestamp = entry.timestamp, "Cache file expired");
            None
        }
    }
}
