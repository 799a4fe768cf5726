//! modelscan - model directory scanner with a fingerprint-validated cache
//!
//! Walks a directory tree for model assets (checkpoints, safetensors, GGUF
//! weights, YAML configs and similar) and caches the listing per directory.
//! A cached listing is served until its TTL runs out or the directory's
//! fingerprint changes, whichever comes first.
//!
//! ```no_run
//! use std::sync::Arc;
//! use modelscan::cache::ScanCache;
//! use modelscan::scanner::{scan_directory, FileRecord};
//! use std::path::Path;
//!
//! let cache: ScanCache<Vec<FileRecord>> = ScanCache::with_default_ttl();
//! let root = Path::new("/models");
//! let (files, cached) = cache.get_or_insert_with(root, || scan_directory(root));
//! println!("{} files (cached: {})", files.len(), cached);
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod scanner;
pub mod service;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::Context;
use bytesize::ByteSize;

use crate::cache::{compute_digest, ScanCache, TreeDigest};
use crate::cli::{Cli, Commands, FingerprintArgs, OutputFormat, ScanArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::service::{jsonl, ScanRequest, ScanResponse, ScanService};

/// Run the command selected on the command line.
///
/// Logging must already be initialized. Output goes to stdout; diagnostics
/// go through `log`.
///
/// # Errors
///
/// Returns an error for invalid configuration, a missing scan path, or an
/// I/O failure on stdout/stdin. Map it to a process code with
/// [`ExitCode::for_error`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = Config::load(cli.config.as_deref());
    config.merge_cli(&cli);
    config.validate()?;
    log::debug!("Effective configuration: {:?}", config);

    match &cli.command {
        Commands::Scan(args) => run_scan(args, &config),
        Commands::Fingerprint(args) => run_fingerprint(args),
        Commands::Serve(_) => run_serve(&config),
    }
}

fn run_scan(args: &ScanArgs, config: &Config) -> anyhow::Result<ExitCode> {
    let service = ScanService::new(
        Arc::new(ScanCache::new(config.ttl())),
        config.walker_config(),
    );
    let response = service.scan(&ScanRequest {
        path: Some(args.path.to_string_lossy().into_owned()),
    })?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Json => {
            let json = if config.pretty {
                serde_json::to_string_pretty(&response)
            } else {
                serde_json::to_string(&response)
            }
            .context("Failed to serialize scan result")?;
            writeln!(out, "{json}")?;
        }
        OutputFormat::Text => write_text(&mut out, &response)?,
    }
    Ok(ExitCode::Success)
}

fn write_text<W: Write>(out: &mut W, response: &ScanResponse) -> io::Result<()> {
    for file in response.files.iter() {
        writeln!(out, "{:>10}  {}", ByteSize(file.size).to_string(), file.path)?;
    }
    let total_size: u64 = response.files.iter().map(|f| f.size).sum();
    writeln!(
        out,
        "{} model file{}, {}",
        response.total,
        if response.total == 1 { "" } else { "s" },
        ByteSize(total_size)
    )
}

fn run_fingerprint(args: &FingerprintArgs) -> anyhow::Result<ExitCode> {
    let digest = compute_digest(&args.path);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", digest.as_str())?;

    match digest {
        TreeDigest::Ready(_) => Ok(ExitCode::Success),
        TreeDigest::Unavailable => {
            log::warn!("Fingerprint unavailable for {}", args.path.display());
            Ok(ExitCode::GeneralError)
        }
    }
}

fn run_serve(config: &Config) -> anyhow::Result<ExitCode> {
    let shutdown = signal::install_handler()?;
    let cache = Arc::new(ScanCache::new(config.ttl()));
    let service = ScanService::new(cache, config.walker_config());
    log::info!(
        "Serving JSON-lines requests on stdin (cache TTL {} min)",
        config.ttl_minutes
    );

    let stdout = io::stdout();
    let summary = jsonl::serve(
        &service,
        io::BufReader::new(io::stdin()),
        stdout.lock(),
        Some(&shutdown),
        config.pretty,
    )
    .context("Serve loop failed")?;

    if summary.interrupted {
        Ok(ExitCode::Interrupted)
    } else {
        Ok(ExitCode::Success)
    }
}
