//! Three-stream file logging (debug/info/error) with rotate-on-previous-failure.
//!
//! A `.failed` sentinel is written at the start of every run and removed only
//! on clean exit. If the sentinel is present from a prior run, the previous
//! three log files are renamed with a UTC timestamp suffix before new ones
//! are truncated into place.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

const SENTINEL_NAME: &str = ".last-run-failed";

fn rotate_if_previous_failure(log_dir: &Path) -> std::io::Result<()> {
    let sentinel = log_dir.join(SENTINEL_NAME);
    if !sentinel.exists() {
        return Ok(());
    }
    let suffix = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
    for name in ["debug.log", "info.log", "error.log"] {
        let path = log_dir.join(name);
        if path.exists() {
            let rotated = log_dir.join(format!("{name}.{suffix}"));
            std::fs::rename(&path, rotated)?;
        }
    }
    std::fs::remove_file(&sentinel)?;
    Ok(())
}

fn write_sentinel(log_dir: &Path) -> std::io::Result<()> {
    std::fs::write(log_dir.join(SENTINEL_NAME), b"")
}

/// Remove the failure sentinel; call on clean shutdown only.
pub fn mark_clean_exit(log_dir: &Path) {
    let _ = std::fs::remove_file(log_dir.join(SENTINEL_NAME));
}

/// Initialize the three-stream file logging plus a console layer, returning
/// guards that must be kept alive for the duration of the process (dropping
/// them flushes and stops the non-blocking writers).
pub struct LoggingGuards {
    _debug: tracing_appender::non_blocking::WorkerGuard,
    _info: tracing_appender::non_blocking::WorkerGuard,
    _error: tracing_appender::non_blocking::WorkerGuard,
}

fn open_truncated(path: &Path) -> std::io::Result<std::fs::File> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
}

pub fn init(log_dir: &Path, verbose: bool) -> anyhow::Result<LoggingGuards> {
    std::fs::create_dir_all(log_dir)?;
    rotate_if_previous_failure(log_dir)?;
    write_sentinel(log_dir)?;

    let debug_file = open_truncated(&PathBuf::from(log_dir).join("debug.log"))?;
    let info_file = open_truncated(&PathBuf::from(log_dir).join("info.log"))?;
    let error_file = open_truncated(&PathBuf::from(log_dir).join("error.log"))?;

    let (debug_writer, debug_guard) = tracing_appender::non_blocking(debug_file);
    let (info_writer, info_guard) = tracing_appender::non_blocking(info_file);
    let (error_writer, error_guard) = tracing_appender::non_blocking(error_file);

    let default_filter = if verbose {
        "declass_pipeline=debug"
    } else {
        "declass_pipeline=info"
    };

    let debug_layer = tracing_subscriber::fmt::layer()
        .with_writer(debug_writer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::DEBUG);
    let info_layer = tracing_subscriber::fmt::layer()
        .with_writer(info_writer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);
    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_writer)
        .with_ansi(false)
        .with_filter(tracing_subscriber::filter::LevelFilter::ERROR);
    let console_layer = tracing_subscriber::fmt::layer().with_filter(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| default_filter.into()),
    );

    tracing_subscriber::registry()
        .with(debug_layer)
        .with(info_layer)
        .with(error_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuards {
        _debug: debug_guard,
        _info: info_guard,
        _error: error_guard,
    })
}
