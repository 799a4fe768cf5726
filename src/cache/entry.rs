//! Cache entry definitions.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::fingerprint::DirectoryFingerprint;

/// One cached scan result. Immutable once built; replaced wholesale on `set`.
#[derive(Debug)]
pub struct CacheEntry<T> {
    path: PathBuf,
    data: Arc<T>,
    written_at: Instant,
    fingerprint: DirectoryFingerprint,
    generation: u64,
}

impl<T> CacheEntry<T> {
    pub(crate) fn new(
        path: PathBuf,
        data: Arc<T>,
        written_at: Instant,
        fingerprint: DirectoryFingerprint,
        generation: u64,
    ) -> Self {
        Self {
            path,
            data,
            written_at,
            fingerprint,
            generation,
        }
    }

    /// The key this entry is stored under.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached payload.
    #[must_use]
    pub fn data(&self) -> &Arc<T> {
        &self.data
    }

    /// The fingerprint captured when the entry was written.
    #[must_use]
    pub fn fingerprint(&self) -> &DirectoryFingerprint {
        &self.fingerprint
    }

    /// Insertion counter, unique per `set`.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Age of the entry at `now`.
    #[must_use]
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.written_at)
    }

    /// An entry is expired once its age reaches `ttl`.
    #[must_use]
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}
