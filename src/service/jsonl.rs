//! Line-delimited JSON front end for [`ScanService`].
//!
//! Each input line is one request object tagged by `op`:
//!
//! ```json
//! {"op": "scan", "path": "/models"}
//! {"op": "clear_cache", "path": "/models"}
//! {"op": "clear_cache"}
//! {"op": "health"}
//! ```
//!
//! Each request produces exactly one output line: the response body with a
//! `code` field added (200 on success), or `{"code": 4xx, "error": "..."}`.

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{ClearCacheRequest, ScanRequest, ScanService, ServiceError};
use crate::signal::ShutdownHandler;

/// How often an idle loop checks the shutdown flag.
pub const SHUTDOWN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A decoded request line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Scan a directory
    Scan(ScanRequest),
    /// Invalidate one path or clear everything
    ClearCache(ClearCacheRequest),
    /// Report health
    Health,
}

#[derive(Serialize)]
struct Reply<B> {
    code: u16,
    #[serde(flatten)]
    body: B,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Totals for a finished serve loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServeSummary {
    /// Requests answered, including error replies
    pub requests: usize,
    /// Requests answered with a non-200 status
    pub errors: usize,
    /// Whether the loop stopped because shutdown was requested
    pub interrupted: bool,
}

fn render<B: Serialize>(status: u16, body: B, pretty: bool) -> String {
    let reply = Reply { code: status, body };
    let rendered = if pretty {
        serde_json::to_string_pretty(&reply)
    } else {
        serde_json::to_string(&reply)
    };
    rendered.unwrap_or_else(|e| {
        log::error!("Failed to serialize response: {}", e);
        r#"{"code":500,"error":"serialization failed"}"#.to_string()
    })
}

fn render_error(err: &ServiceError, pretty: bool) -> String {
    render(
        err.status(),
        ErrorBody {
            error: err.to_string(),
        },
        pretty,
    )
}

/// Handle one request line, returning the response line and its status.
#[must_use]
pub fn dispatch(service: &ScanService, line: &str, pretty: bool) -> (String, u16) {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            let err = ServiceError::BadRequest(e.to_string());
            log::warn!("{}", err);
            return (render_error(&err, pretty), err.status());
        }
    };
    log::debug!("Received request: {:?}", request);

    match request {
        Request::Scan(req) => match service.scan(&req) {
            Ok(resp) => (render(200, resp, pretty), 200),
            Err(err) => (render_error(&err, pretty), err.status()),
        },
        Request::ClearCache(req) => (render(200, service.clear_cache(&req), pretty), 200),
        Request::Health => (render(200, service.health(), pretty), 200),
    }
}

/// Answer requests from `reader` until EOF or shutdown.
///
/// Lines are read on a helper thread so a blocked read never delays
/// shutdown: the flag is polled every [`SHUTDOWN_POLL_INTERVAL`] while
/// idle. A request already being handled always completes. Blank lines are
/// ignored.
///
/// # Errors
///
/// Returns an I/O error if the reader thread cannot start, or if reading
/// input or writing output fails.
pub fn serve<R, W>(
    service: &ScanService,
    reader: R,
    mut writer: W,
    shutdown: Option<&ShutdownHandler>,
    pretty: bool,
) -> std::io::Result<ServeSummary>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let (tx, rx) = mpsc::channel();
    // Detached: on shutdown it may still be parked in read()
    thread::Builder::new()
        .name("modelscan-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;

    let mut summary = ServeSummary::default();
    loop {
        if shutdown.is_some_and(ShutdownHandler::is_shutdown_requested) {
            log::info!("Shutdown requested, stopping serve loop");
            summary.interrupted = true;
            break;
        }

        let line = match rx.recv_timeout(SHUTDOWN_POLL_INTERVAL) {
            Ok(line) => line?,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let (response, status) = dispatch(service, &line, pretty);
        writeln!(writer, "{response}")?;
        writer.flush()?;

        summary.requests += 1;
        if status != 200 {
            summary.errors += 1;
        }
    }

    log::info!(
        "Serve loop finished: {} requests, {} errors",
        summary.requests,
        summary.errors
    );
    Ok(summary)
}
