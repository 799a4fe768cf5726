//! In-memory scan result cache with TTL and fingerprint validation.
//!
//! A lookup hits only while the entry is younger than the TTL and a fresh
//! fingerprint of its directory still matches the one captured at write
//! time. Anything else evicts the entry and reports a miss; the caller is
//! expected to rescan and `set` again.
//!
//! # Locking
//!
//! One mutex guards the map, but it is never held across filesystem I/O.
//! `get` clones the entry out, releases the lock, re-walks the directory,
//! and only then re-locks to evict. Eviction is skipped if the map no longer
//! holds the same generation, so a `set` that lands during validation is
//! never thrown away. `set` captures its fingerprint before taking the lock.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

use super::clock::{Clock, SystemClock};
use super::entry::CacheEntry;
use super::fingerprint::DirectoryFingerprint;

/// Default time-to-live for cached scans.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of entries currently held (valid or not yet re-checked)
    pub entry_count: usize,
    /// Configured TTL in minutes
    pub ttl_minutes: f64,
}

struct CacheState<T> {
    entries: HashMap<PathBuf, Arc<CacheEntry<T>>>,
    next_generation: u64,
}

/// Thread-safe cache of scan results keyed by scanned path.
///
/// Share it as `Arc<ScanCache<T>>`; all methods take `&self`.
///
/// # Example
///
/// ```no_run
/// use modelscan::cache::ScanCache;
/// use modelscan::scanner::scan_directory;
/// use std::path::Path;
///
/// let cache = ScanCache::with_default_ttl();
/// let root = Path::new("/models");
///
/// let files = match cache.get(root) {
///     Some(files) => files,
///     None => cache.set(root, scan_directory(root)),
/// };
/// println!("{} model files", files.len());
/// ```
pub struct ScanCache<T> {
    state: Mutex<CacheState<T>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<T> ScanCache<T> {
    /// Create a cache with the given TTL and the system clock.
    ///
    /// A zero TTL makes every entry expire immediately.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a cache with the default five minute TTL.
    #[must_use]
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Create a cache reading time from `clock`.
    #[must_use]
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                next_generation: 0,
            }),
            ttl,
            clock,
        }
    }

    /// The configured time-to-live.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // Entries are immutable, so a panic elsewhere cannot leave a torn map.
    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Look up a cached result, validating age and directory state.
    ///
    /// On a stale-fingerprint check this performs a full directory walk, so
    /// it can be as slow as a scan. The walk runs without the cache lock.
    pub fn get(&self, path: &Path) -> Option<Arc<T>> {
        let Some(entry) = self.lock().entries.get(path).cloned() else {
            log::debug!("Cache miss for path: {}", path.display());
            return None;
        };

        if entry.is_expired(self.clock.now(), self.ttl) {
            log::info!("Cache expired for path: {}", path.display());
            self.evict_if_current(path, entry.generation());
            return None;
        }

        if !entry.fingerprint().is_valid() {
            log::info!("Directory state changed for path: {}", path.display());
            self.evict_if_current(path, entry.generation());
            return None;
        }

        log::info!("Cache hit for path: {}", path.display());
        Some(Arc::clone(entry.data()))
    }

    /// Store a result for `path`, replacing any previous entry.
    ///
    /// Captures a fresh fingerprint of `path` before inserting. Returns the
    /// stored payload so callers can hand it straight back out.
    pub fn set(&self, path: &Path, data: T) -> Arc<T> {
        let written_at = self.clock.now();
        let fingerprint = DirectoryFingerprint::capture(path);
        if !fingerprint.digest().is_ready() {
            log::warn!(
                "Caching {} with an unavailable fingerprint; next lookup will miss",
                path.display()
            );
        }

        let data = Arc::new(data);
        let mut state = self.lock();
        let generation = state.next_generation;
        state.next_generation += 1;
        state.entries.insert(
            path.to_path_buf(),
            Arc::new(CacheEntry::new(
                path.to_path_buf(),
                Arc::clone(&data),
                written_at,
                fingerprint,
                generation,
            )),
        );
        drop(state);

        log::info!("Cached results for path: {}", path.display());
        data
    }

    /// Return the cached result for `path`, or compute, store and return it.
    ///
    /// The boolean is `true` when the result came from the cache.
    pub fn get_or_insert_with<F>(&self, path: &Path, compute: F) -> (Arc<T>, bool)
    where
        F: FnOnce() -> T,
    {
        match self.get(path) {
            Some(data) => (data, true),
            None => (self.set(path, compute()), false),
        }
    }

    /// Drop the entry for `path`. Returns whether one was present.
    pub fn invalidate(&self, path: &Path) -> bool {
        let removed = self.lock().entries.remove(path).is_some();
        log::info!("Invalidated cache for path: {}", path.display());
        removed
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock().entries.clear();
        log::info!("Cleared entire cache");
    }

    /// Number of entries held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of entry count and TTL. Does no I/O.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entry_count: self.len(),
            ttl_minutes: self.ttl.as_secs_f64() / 60.0,
        }
    }

    fn evict_if_current(&self, path: &Path, generation: u64) {
        let mut state = self.lock();
        let is_current = state
            .entries
            .get(path)
            .is_some_and(|e| e.generation() == generation);
        if is_current {
            state.entries.remove(path);
            log::debug!("Evicted cache entry for path: {}", path.display());
        } else {
            log::debug!(
                "Entry for {} was replaced during validation; keeping the newer one",
                path.display()
            );
        }
    }
}

impl<T> Default for ScanCache<T> {
    fn default() -> Self {
        Self::with_default_ttl()
    }
}

impl<T> std::fmt::Debug for ScanCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanCache")
            .field("entries", &self.len())
            .field("ttl", &self.ttl)
            .field("clock", &self.clock)
            .finish()
    }
}
