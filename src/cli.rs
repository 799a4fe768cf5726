//! Command-line interface for modelscan.
//!
//! ```bash
//! # One-shot scan, JSON output
//! modelscan scan ~/models
//!
//! # Human-readable listing
//! modelscan scan ~/models --output text
//!
//! # Print the directory fingerprint
//! modelscan fingerprint ~/models
//!
//! # Answer JSON-lines requests on stdin with a 10 minute cache
//! modelscan -v serve --ttl-minutes 10
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Model directory scanner with a fingerprint-validated cache.
///
/// Lists model weight and config files (ckpt, safetensors, pt, bin, yaml,
/// vae, sft, gguf) under a directory and caches results until the TTL
/// expires or the directory changes.
#[derive(Debug, Parser)]
#[command(name = "modelscan")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "FILE", global = true, env = "MODELSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan a directory once and print the model files found
    Scan(ScanArgs),
    /// Print the fingerprint digest of a directory
    Fingerprint(FingerprintArgs),
    /// Answer JSON-lines requests from stdin until EOF or Ctrl+C
    Serve(ServeArgs),
}

/// Arguments for `scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Arguments for `fingerprint`.
#[derive(Debug, Args)]
pub struct FingerprintArgs {
    /// Directory to fingerprint
    #[arg(value_name = "PATH")]
    pub path: PathBuf,
}

/// Arguments for `serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Cache time-to-live in minutes (overrides config)
    #[arg(long, value_name = "N")]
    pub ttl_minutes: Option<u64>,

    /// Pretty-print each response (one response may then span several lines)
    #[arg(long)]
    pub pretty: bool,

    #[command(flatten)]
    pub walk: WalkArgs,
}

/// Traversal flags shared by `scan` and `serve`.
#[derive(Debug, Args, Default)]
pub struct WalkArgs {
    /// Follow symbolic links while scanning
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links (overrides config)
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,
}

impl WalkArgs {
    /// Explicit symlink choice, if either flag was given.
    #[must_use]
    pub fn follow_symlinks_override(&self) -> Option<bool> {
        if self.follow_symlinks {
            Some(true)
        } else if self.no_follow_symlinks {
            Some(false)
        } else {
            None
        }
    }
}

/// Output format for `scan`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// `{"files": [...], "total": N, "cached": false}`
    #[default]
    Json,
    /// One line per file with a human-readable size
    Text,
}
