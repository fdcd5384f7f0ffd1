//! Tracing subscriber setup.
//!
//! Headless modes log to stderr. The TUI owns the terminal, so it logs to a file under the
//! platform data directory instead, or not at all when that directory is unavailable.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub enum LogSink {
    Stderr,
    File,
}

pub fn log_file_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("workout-timer").join("workout-timer.log"))
}

/// `RUST_LOG` wins over the CLI default level.
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Returns the log file path when logging to a file.
pub fn init(sink: LogSink, default_level: &str) -> Result<Option<PathBuf>> {
    let filter = env_filter(default_level);
    match sink {
        LogSink::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
            Ok(None)
        }
        LogSink::File => {
            let Some(path) = log_file_path() else {
                return Ok(None);
            };
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create log dir {}", parent.display()))?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("install tracing subscriber: {e}"))?;
            Ok(Some(path))
        }
    }
}
