//! Tracing subscriber setup.
//!
//! Diagnostics go to stderr (and optionally a log file); transfer reports
//! are printed to stdout separately so they can be piped.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::{default_log_dir, LoggingConfig};

/// Log file name inside the platform log directory.
pub const LOG_FILE_NAME: &str = "playlist-bridge.log";

/// Returns the filter used when `RUST_LOG` is not set.
pub fn default_directive(config: &LoggingConfig) -> String {
    if config.verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

/// Returns the log file path used when file logging is enabled.
pub fn log_file_path() -> PathBuf {
    default_log_dir().join(LOG_FILE_NAME)
}

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. A log file that
/// cannot be opened is reported on stderr and skipped. Calling this twice
/// keeps the first subscriber.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config)));

    let file_layer = if config.log_to_file {
        match open_log_file() {
            Ok(file) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!("Warning: could not open log file {}: {}", log_file_path().display(), e);
                None
            }
        }
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init();
}

fn open_log_file() -> std::io::Result<std::fs::File> {
    let path = log_file_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
