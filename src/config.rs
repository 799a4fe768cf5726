//! Layered configuration.
//!
//! Sources are merged lowest to highest:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config`, or `config.toml` in the platform config dir)
//! 3. `MODELSCAN_*` environment variables, e.g. `MODELSCAN_TTL_MINUTES=10`
//! 4. CLI flags, via [`Config::merge_cli`]
//!
//! ```toml
//! ttl_minutes = 10
//! follow_symlinks = false
//! skip_hidden = true
//! pretty = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{Cli, Commands};
use crate::scanner::WalkerConfig;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "MODELSCAN_";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The TTL must be at least one minute.
    #[error("ttl_minutes must be greater than zero")]
    InvalidTtl,

    /// A source could not be parsed.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The configuration file could not be written.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Effective settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache time-to-live in minutes
    pub ttl_minutes: u64,
    /// Follow symbolic links while scanning
    pub follow_symlinks: bool,
    /// Skip dot-files and dot-directories
    pub skip_hidden: bool,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_minutes: 5,
            follow_symlinks: false,
            skip_hidden: false,
            pretty: false,
        }
    }
}

impl Config {
    /// Load from the CLI-selected file, or the platform default location.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from_path(path),
            None => Self::load_layers(Figment::new()),
        }
    }

    /// Load defaults, then `path` (if it exists), then the environment.
    ///
    /// A broken file or bad environment value is logged and the defaults are
    /// used instead, so a typo never stops the scanner from starting.
    #[must_use]
    pub fn load_from_path(path: PathBuf) -> Self {
        log::debug!("Loading configuration from {}", path.display());
        Self::load_layers(Figment::new().merge(Toml::file(path)))
    }

    fn load_layers(file: Figment) -> Self {
        match Self::try_extract(file) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using defaults", e);
                Self::default()
            }
        }
    }

    fn try_extract(file: Figment) -> Result<Self, ConfigError> {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(|e| ConfigError::Load(Box::new(e)))
    }

    /// `config.toml` in the platform config directory.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "modelscan", "modelscan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Write these settings as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Fails if the settings cannot be serialized or the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let write = |p: &Path| -> std::io::Result<()> {
            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(p, content.as_bytes())
        };
        write(path).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply CLI flags on top of the loaded values.
    pub fn merge_cli(&mut self, cli: &Cli) {
        match &cli.command {
            Commands::Scan(args) => {
                if let Some(follow) = args.walk.follow_symlinks_override() {
                    self.follow_symlinks = follow;
                }
                self.skip_hidden |= args.walk.skip_hidden;
                self.pretty |= args.pretty;
            }
            Commands::Serve(args) => {
                if let Some(ttl) = args.ttl_minutes {
                    self.ttl_minutes = ttl;
                }
                if let Some(follow) = args.walk.follow_symlinks_override() {
                    self.follow_symlinks = follow;
                }
                self.skip_hidden |= args.walk.skip_hidden;
                self.pretty |= args.pretty;
            }
            Commands::Fingerprint(_) => {}
        }
    }

    /// Reject settings the cache cannot honor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidTtl`] when `ttl_minutes` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl_minutes == 0 {
            return Err(ConfigError::InvalidTtl);
        }
        Ok(())
    }

    /// The TTL as a `Duration`.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_minutes.saturating_mul(60))
    }

    /// Traversal options for the scanner.
    #[must_use]
    pub fn walker_config(&self) -> WalkerConfig {
        WalkerConfig::new(self.follow_symlinks, self.skip_hidden)
    }
}
