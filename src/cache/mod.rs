//! Scan result caching for modelscan.
//!
//! This module keeps recent scan results in memory so repeated requests for
//! the same model directory do not re-walk large trees.
//!
//! # Architecture
//!
//! The caching system is split into these components:
//!
//! * [`fingerprint`]: Digests a directory tree's tracked-file metadata and
//!   re-checks it against the live filesystem.
//! * [`entry`]: The immutable record stored per scanned path.
//! * [`store`]: The thread-safe [`ScanCache`] map with TTL enforcement.
//! * [`clock`]: Time sources, so expiry can be driven manually in tests.
//!
//! # Cache Invalidation
//!
//! A lookup is a hit only if both hold:
//! * the entry is younger than the configured TTL
//! * the directory fingerprint (path, size and mtime of every tracked file)
//!   is unchanged since the entry was written
//!
//! Otherwise the entry is evicted and the caller rescans. Nothing is
//! persisted; the cache lives for the life of the process.

pub mod clock;
pub mod entry;
pub mod fingerprint;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use fingerprint::{compute_digest, digest_stats, DirectoryFingerprint, FileStat, TreeDigest};
pub use store::{CacheStats, ScanCache, DEFAULT_TTL};
