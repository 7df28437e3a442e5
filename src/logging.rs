//! Log sink setup.
//!
//! Stdout carries protocol frames, so logs go to an append-only file, or to
//! stderr when the file cannot be opened. The returned [`LogGuard`] must live
//! as long as the process; dropping it flushes pending lines.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use tracing::error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogConfig;
use crate::error::NmError;

/// Where log lines end up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    File(PathBuf),
    Stderr,
}

/// Keeps the background log writer alive.
#[must_use = "dropping the guard stops log output"]
pub struct LogGuard {
    sink: LogSink,
    _worker: WorkerGuard,
}

impl LogGuard {
    pub fn sink(&self) -> &LogSink {
        &self.sink
    }
}

/// Install the global subscriber. Call once, at process start.
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, NmError> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.max_level).into())
        .from_env_lossy();

    let (writer, worker, sink, open_error) = open_sink(&config.file);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer),
        )
        .try_init()
        .map_err(|e| NmError::Logging(e.to_string()))?;

    if let Some(e) = open_error {
        error!(
            path = %config.file.display(),
            error = %e,
            "unable to create and/or open log file, logging to stderr"
        );
    }

    Ok(LogGuard {
        sink,
        _worker: worker,
    })
}

fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn open_sink(path: &Path) -> (NonBlocking, WorkerGuard, LogSink, Option<io::Error>) {
    match open_log_file(path) {
        Ok(file) => {
            let (writer, worker) = tracing_appender::non_blocking(file);
            (writer, worker, LogSink::File(path.to_path_buf()), None)
        }
        Err(e) => {
            let (writer, worker) = tracing_appender::non_blocking(io::stderr());
            (writer, worker, LogSink::Stderr, Some(e))
        }
    }
}
