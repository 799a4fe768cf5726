//! Directory fingerprinting for cache validation.
//!
//! A fingerprint summarizes the tracked files of a directory tree as a single
//! SHA-256 digest over their `(path, size, mtime)` metadata. Two fingerprints
//! of the same root are equal exactly when no tracked file was added, removed,
//! renamed, resized or touched in between. File contents are never read, so a
//! rewrite that preserves both size and mtime goes unnoticed.
//!
//! # Digest construction
//!
//! Every file whose extension is in [`MODEL_EXTENSIONS`](crate::scanner::MODEL_EXTENSIONS)
//! contributes one line `"{full_path}|{size}|{mtime}"`, with mtime rendered as
//! `seconds.nanoseconds` since the Unix epoch. Lines are sorted
//! lexicographically, joined with `|`, and hashed. Sorting makes the digest
//! independent of directory iteration order.
//!
//! # Failure handling
//!
//! A file that disappears or cannot be stat'ed mid-walk is logged and left
//! out. If the root itself cannot be read the result is
//! [`TreeDigest::Unavailable`], which never validates.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use crate::scanner::is_model_file;

/// Outcome of digesting a directory tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TreeDigest {
    /// Lowercase hex SHA-256 of the sorted metadata lines.
    Ready(String),
    /// The root could not be walked; the tree state is unknown.
    Unavailable,
}

impl TreeDigest {
    /// The hex digest, or `""` when unavailable.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ready(hex) => hex,
            Self::Unavailable => "",
        }
    }

    /// Whether a digest was produced.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Whether `other` describes the same known tree state.
    ///
    /// `Unavailable` matches nothing, not even another `Unavailable`.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ready(a), Self::Ready(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for TreeDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata of one tracked file, the unit a fingerprint is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    /// Full path (root joined with the walk-relative path)
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl FileStat {
    /// Render the `path|size|mtime` line hashed into the digest.
    #[must_use]
    pub fn line(&self) -> String {
        format!(
            "{}|{}|{}",
            self.path.to_string_lossy(),
            self.size,
            format_mtime(self.modified)
        )
    }
}

/// Render a timestamp as `seconds.nanoseconds` relative to the Unix epoch.
fn format_mtime(time: SystemTime) -> String {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => format!("{}.{:09}", d.as_secs(), d.subsec_nanos()),
        Err(e) => {
            let d = e.duration();
            format!("-{}.{:09}", d.as_secs(), d.subsec_nanos())
        }
    }
}

/// A digest of a directory tree's tracked files, taken at one point in time.
#[derive(Debug, Clone)]
pub struct DirectoryFingerprint {
    root: PathBuf,
    digest: TreeDigest,
    captured_at: DateTime<Utc>,
}

impl DirectoryFingerprint {
    /// Walk `root` and fingerprint its current state.
    ///
    /// Never fails: an unreadable root produces [`TreeDigest::Unavailable`].
    #[must_use]
    pub fn capture(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            digest: compute_digest(root),
            captured_at: Utc::now(),
        }
    }

    /// Build a fingerprint from already collected file metadata.
    ///
    /// The order of `stats` does not affect the digest.
    #[must_use]
    pub fn from_stats<I>(root: &Path, stats: I) -> Self
    where
        I: IntoIterator<Item = FileStat>,
    {
        Self {
            root: root.to_path_buf(),
            digest: TreeDigest::Ready(digest_stats(stats)),
            captured_at: Utc::now(),
        }
    }

    /// The root this fingerprint describes.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The captured digest.
    #[must_use]
    pub fn digest(&self) -> &TreeDigest {
        &self.digest
    }

    /// When the fingerprint was taken. Informational only.
    #[must_use]
    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Re-walk the root and check that nothing tracked has changed.
    ///
    /// Costs a full walk of the tree. Returns `false` when either the stored
    /// or the fresh digest is unavailable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.matches(&compute_digest(&self.root))
    }

    /// Compare against a digest computed elsewhere for the same root.
    #[must_use]
    pub fn matches(&self, current: &TreeDigest) -> bool {
        self.digest.matches(current)
    }
}

/// Walk `root` and digest its tracked files.
#[must_use]
pub fn compute_digest(root: &Path) -> TreeDigest {
    match collect_stats(root) {
        Some(stats) => TreeDigest::Ready(digest_stats(stats)),
        None => TreeDigest::Unavailable,
    }
}

/// Hash a set of file stats into a hex digest, independent of input order.
#[must_use]
pub fn digest_stats<I>(stats: I) -> String
where
    I: IntoIterator<Item = FileStat>,
{
    let mut lines: Vec<String> = stats.into_iter().map(|s| s.line()).collect();
    lines.sort_unstable();

    let mut hasher = Sha256::new();
    hasher.update(lines.join("|").as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Collect stats for every tracked file under `root`.
///
/// Returns `None` when the root is missing, not a directory, or unreadable.
/// Errors below the root are logged and skipped.
fn collect_stats(root: &Path) -> Option<Vec<FileStat>> {
    match std::fs::metadata(root) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            log::error!(
                "Error calculating directory hash: {} is not a directory",
                root.display()
            );
            return None;
        }
        Err(e) => {
            log::error!("Error calculating directory hash for {}: {}", root.display(), e);
            return None;
        }
    }

    let mut stats = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                log::error!("Error calculating directory hash for {}: {}", root.display(), e);
                return None;
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                continue;
            }
        };

        if entry.file_type().is_dir() || !is_model_file(entry.path()) {
            continue;
        }

        // Symlinked files count by their target's metadata
        match stat_file(entry.path()) {
            Ok(Some(stat)) => stats.push(stat),
            Ok(None) => {}
            Err(e) => {
                log::warn!("Error accessing file {}: {}", entry.path().display(), e);
            }
        }
    }

    log::trace!("Fingerprinted {} files under {}", stats.len(), root.display());
    Some(stats)
}

fn stat_file(path: &Path) -> std::io::Result<Option<FileStat>> {
    let meta = std::fs::metadata(path)?;
    if !meta.is_file() {
        return Ok(None);
    }
    Ok(Some(FileStat {
        path: path.to_path_buf(),
        size: meta.len(),
        modified: meta.modified()?,
    }))
}
