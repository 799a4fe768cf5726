//! Request handlers over the scan cache.
//!
//! [`ScanService`] owns a shared [`ScanCache`] and exposes the three
//! operations a front end needs: scan a directory (served from cache when
//! still valid), clear the cache, and report health. Handlers are
//! transport-neutral; [`jsonl`] drives them from a line-delimited JSON stream.
//!
//! Status codes follow HTTP conventions so a transport can map them
//! directly: 200 on success, 400 for malformed requests, 404 for a missing
//! scan path.

pub mod jsonl;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::ScanCache;
use crate::scanner::{scan_directory_with, FileRecord, WalkerConfig};

/// The cache type shared by handlers.
pub type RecordCache = ScanCache<Vec<FileRecord>>;

/// Request to scan a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Directory to scan
    #[serde(default)]
    pub path: Option<String>,
}

/// Scan result.
///
/// `files` shares the cached listing, so a cache hit copies no records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResponse {
    /// Model files found, in walk order
    pub files: Arc<Vec<FileRecord>>,
    /// Number of files
    pub total: usize,
    /// Whether the result was served from the cache
    pub cached: bool,
}

/// Request to clear one cached path, or everything when `path` is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearCacheRequest {
    /// Path to invalidate
    #[serde(default)]
    pub path: Option<String>,
}

/// Result of a cache clear.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearCacheResponse {
    /// Human-readable description of what was cleared
    pub message: String,
}

/// Service health and cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthResponse {
    /// Always `"healthy"` when the service answers
    pub status: &'static str,
    /// Entries currently cached
    pub cache_size: usize,
    /// Configured TTL in minutes
    pub cache_ttl_minutes: f64,
    /// Active log level
    pub log_level: &'static str,
}

/// Errors returned by request handlers.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The request carried no path.
    #[error("No path provided")]
    MissingPath,

    /// The requested path does not exist.
    #[error("Path does not exist: {0}")]
    PathNotFound(String),

    /// The request could not be parsed.
    #[error("Invalid request: {0}")]
    BadRequest(String),
}

impl ServiceError {
    /// HTTP-style status code for this error.
    #[must_use]
    pub fn status(&self) -> u16 {
        match self {
            Self::MissingPath | Self::BadRequest(_) => 400,
            Self::PathNotFound(_) => 404,
        }
    }
}

/// Scan handlers sharing one cache.
#[derive(Debug, Clone)]
pub struct ScanService {
    cache: Arc<RecordCache>,
    walker_config: WalkerConfig,
}

impl ScanService {
    /// Create a service over an injected cache.
    #[must_use]
    pub fn new(cache: Arc<RecordCache>, walker_config: WalkerConfig) -> Self {
        Self {
            cache,
            walker_config,
        }
    }

    /// The shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<RecordCache> {
        &self.cache
    }

    /// Scan `request.path`, answering from the cache when it is still valid.
    ///
    /// # Errors
    ///
    /// [`ServiceError::MissingPath`] if no path was given and
    /// [`ServiceError::PathNotFound`] if it does not exist.
    pub fn scan(&self, request: &ScanRequest) -> Result<ScanResponse, ServiceError> {
        let raw = request
            .path
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or(ServiceError::MissingPath)?;
        log::info!("Processing scan request for: {}", raw);

        let path = cache_key(Path::new(raw));
        if !path.exists() {
            log::error!("Path does not exist: {}", raw);
            return Err(ServiceError::PathNotFound(raw.to_string()));
        }

        let (files, cached) = self
            .cache
            .get_or_insert_with(&path, || scan_directory_with(&path, &self.walker_config));

        log::info!("Sending response with {} files (cached: {})", files.len(), cached);
        Ok(ScanResponse {
            total: files.len(),
            files,
            cached,
        })
    }

    /// Invalidate one path, or clear the whole cache.
    #[must_use]
    pub fn clear_cache(&self, request: &ClearCacheRequest) -> ClearCacheResponse {
        let message = match request.path.as_deref().filter(|p| !p.is_empty()) {
            Some(raw) => {
                self.cache.invalidate(&cache_key(Path::new(raw)));
                format!("Cleared cache for path: {raw}")
            }
            None => {
                self.cache.clear();
                "Cleared entire cache".to_string()
            }
        };
        ClearCacheResponse { message }
    }

    /// Report health and cache statistics. Does no I/O.
    #[must_use]
    pub fn health(&self) -> HealthResponse {
        let stats = self.cache.stats();
        log::debug!("Health check - Cache stats: {:?}", stats);
        HealthResponse {
            status: "healthy",
            cache_size: stats.entry_count,
            cache_ttl_minutes: stats.ttl_minutes,
            log_level: crate::logging::current_level_name(),
        }
    }
}

/// Normalize a request path into the key used for the cache.
///
/// Relative paths are made absolute against the working directory so
/// `./models` and its absolute spelling share one entry.
#[must_use]
pub fn cache_key(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
