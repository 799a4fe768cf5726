//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing model storage
//! trees and collecting metadata for every file with a recognized model
//! extension. It uses [`jwalk`] for parallel directory reading, which matters
//! on large checkpoint directories and network mounts.
//!
//! # Features
//!
//! - Parallel directory traversal using rayon thread pool
//! - Deterministic per-directory ordering (children sorted by name)
//! - Symlinked files listed by their target's metadata; descent into
//!   symlinked directories only when configured
//! - Hidden file filtering
//!
//! # Example
//!
//! ```no_run
//! use modelscan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/models"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} model files", files.len());
//! ```

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use jwalk::WalkDir;

use super::{is_model_file, FileEntry, ScanError, WalkerConfig};

/// Directory walker for parallel model file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
        }
    }

    /// Get the root directory being walked.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walk the directory tree, yielding model file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration, so one unreadable subdirectory never hides the rest of
    /// the tree.
    ///
    /// A symlinked file is always listed with its target's size and mtime.
    /// `follow_symlinks` only controls descent into symlinked directories.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let walk_dir = WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .skip_hidden(self.config.skip_hidden)
            .process_read_dir(|_depth, _path, _read_dir_state, children| {
                // Sort children for deterministic output
                children.sort_by(|a, b| match (a, b) {
                    (Ok(a), Ok(b)) => a.file_name().cmp(b.file_name()),
                    (Ok(_), Err(_)) => std::cmp::Ordering::Less,
                    (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
                    (Err(_), Err(_)) => std::cmp::Ordering::Equal,
                });
            });

        walk_dir.into_iter().filter_map(move |entry_result| {
            match entry_result {
                Ok(entry) => {
                    let path = entry.path();

                    if path == self.root {
                        return None;
                    }

                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }

                    if !is_model_file(&path) {
                        log::trace!("Skipping non-model file: {}", path.display());
                        return None;
                    }

                    // Unfollowed directory links fail the is_file check below
                    let is_symlink = entry.path_is_symlink();
                    match std::fs::metadata(&path) {
                        Ok(m) => Self::process_file_entry(path, &m, is_symlink),
                        Err(e) => Some(Self::handle_io_error(&path, e)),
                    }
                }
                Err(e) => {
                    let path = e
                        .path()
                        .map_or_else(|| self.root.clone(), std::borrow::ToOwned::to_owned);
                    Some(Self::handle_jwalk_error(path, e))
                }
            }
        })
    }

    /// Build a [`FileEntry`] from metadata, skipping anything that is not a
    /// regular file after symlink resolution.
    fn process_file_entry(
        path: PathBuf,
        metadata: &Metadata,
        is_symlink: bool,
    ) -> Option<Result<FileEntry, ScanError>> {
        if !metadata.is_file() {
            return None;
        }
        build_entry(path, metadata.len(), metadata.modified(), is_symlink).map(Ok)
    }

    /// Handle I/O errors during file access.
    fn handle_io_error(path: &Path, error: std::io::Error) -> Result<FileEntry, ScanError> {
        use std::io::ErrorKind;

        match error.kind() {
            ErrorKind::PermissionDenied => {
                log::warn!("Permission denied: {}", path.display());
                Err(ScanError::PermissionDenied(path.to_path_buf()))
            }
            ErrorKind::NotFound => {
                log::debug!("File not found (may have been deleted): {}", path.display());
                Err(ScanError::NotFound(path.to_path_buf()))
            }
            _ => {
                log::warn!("I/O error for {}: {}", path.display(), error);
                Err(ScanError::Io {
                    path: path.to_path_buf(),
                    source: error,
                })
            }
        }
    }

    /// Handle jwalk errors.
    fn handle_jwalk_error(path: PathBuf, error: jwalk::Error) -> Result<FileEntry, ScanError> {
        log::warn!("Walker error for {}: {}", path.display(), error);
        Err(ScanError::Io {
            path,
            source: std::io::Error::other(error.to_string()),
        })
    }
}

/// A file without a readable mtime is skipped, matching the fingerprint.
fn build_entry(
    path: PathBuf,
    size: u64,
    modified: std::io::Result<SystemTime>,
    is_symlink: bool,
) -> Option<FileEntry> {
    match modified {
        Ok(modified) => Some(FileEntry {
            path,
            size,
            modified,
            is_symlink,
        }),
        Err(e) => {
            log::warn!("Error accessing file {}: {}", path.display(), e);
            None
        }
    }
}
