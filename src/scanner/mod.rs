//! Scanner module for model-asset discovery.
//!
//! This module provides functionality for:
//! - Parallel directory walking using jwalk
//! - Filtering by the recognized model-asset extension set
//! - Producing serializable [`FileRecord`]s for scan results
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//!
//! The free function [`scan_directory`] is the scan routine consumed by the
//! cache layer: it never fails, logging and skipping unreadable entries.
//!
//! # Example
//!
//! ```no_run
//! use modelscan::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/models"), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub use walker::Walker;

/// File extensions treated as model assets, lowercase and without the dot.
pub const MODEL_EXTENSIONS: &[&str] = &[
    "ckpt",
    "safetensors",
    "pt",
    "bin",
    "yaml",
    "vae",
    "sft",
    "gguf",
];

/// Check whether a path carries a recognized model-asset extension.
///
/// Only the final extension is considered, compared case-insensitively.
///
/// ```
/// use modelscan::scanner::is_model_file;
/// use std::path::Path;
///
/// assert!(is_model_file(Path::new("/models/sdxl.SafeTensors")));
/// assert!(!is_model_file(Path::new("/models/notes.txt")));
/// assert!(!is_model_file(Path::new("/models/bin")));
/// ```
#[must_use]
pub fn is_model_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MODEL_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Metadata for a discovered model file.
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// Full path to the file (root joined with the relative walk path)
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Whether this file was reached through a symbolic link
    pub is_symlink: bool,
}

/// A single scan result as returned to callers.
///
/// The cache stores these opaquely; only the scanner and the output layer
/// look inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// File name without directories
    pub name: String,
    /// Full path as a string
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Modification time, ISO-8601 in local time
    pub modified: String,
}

impl From<&FileEntry> for FileRecord {
    fn from(entry: &FileEntry) -> Self {
        let modified: DateTime<Local> = entry.modified.into();
        Self {
            name: entry
                .path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: entry.path.to_string_lossy().into_owned(),
            size: entry.size,
            modified: modified.format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
        }
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    /// Warning: May cause infinite loops with symlink cycles.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,
}

impl WalkerConfig {
    /// Create a new configuration.
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
        }
    }
}

/// Errors that can occur during directory scanning.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Scan a directory for model files using the default walker configuration.
///
/// Returns records in walk order. A missing or unreadable root, or a tree
/// without model files, yields an empty list. Per-entry errors are logged
/// and skipped.
#[must_use]
pub fn scan_directory(path: &Path) -> Vec<FileRecord> {
    scan_directory_with(path, &WalkerConfig::default())
}

/// Scan a directory for model files with an explicit walker configuration.
#[must_use]
pub fn scan_directory_with(path: &Path, config: &WalkerConfig) -> Vec<FileRecord> {
    let root = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    log::info!("Starting to scan directory: {}", root.display());

    if !root.is_dir() {
        log::error!("Cannot scan {}: not a readable directory", root.display());
        return Vec::new();
    }

    let walker = Walker::new(&root, config.clone());
    let records: Vec<FileRecord> = walker
        .walk()
        .filter_map(|entry| match entry {
            Ok(file) => {
                if file.is_symlink {
                    log::trace!("Adding model file via symlink: {}", file.path.display());
                } else {
                    log::trace!("Adding model file: {}", file.path.display());
                }
                Some(FileRecord::from(&file))
            }
            Err(e) => {
                log::debug!("Skipping entry: {}", e);
                None
            }
        })
        .collect();

    log::info!("Scan completed. Found {} files", records.len());
    records
}
