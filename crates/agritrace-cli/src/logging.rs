//! Tracing subscriber setup.
//!
//! The console owns stdout, so log output goes to a file by default. When
//! the file cannot be opened the subscriber falls back to stderr.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use agritrace_core::config::LoggingConfig;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Where log output ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Appending to this file.
    File(PathBuf),
    /// Writing to standard error.
    Stderr,
}

impl fmt::Display for LogTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Stderr => f.write_str("stderr"),
        }
    }
}

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
pub fn init(config: &LoggingConfig) -> LogTarget {
    if let Some(path) = &config.file {
        match open_log_file(path) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .with_env_filter(env_filter(&config.level))
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(true)
                    .init();
                return LogTarget::File(path.clone());
            }
            Err(e) => {
                init_stderr(&config.level);
                warn!(path = %path.display(), error = %e, "Could not open log file, logging to stderr");
                return LogTarget::Stderr;
            }
        }
    }
    init_stderr(&config.level);
    LogTarget::Stderr
}

fn init_stderr(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Open `path` for appending, creating it and its parent directories.
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
