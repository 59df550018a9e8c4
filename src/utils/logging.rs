//! Logging initialization for chefbot.
//!
//! Supports three formats:
//! - `pretty`: multi-line, human-readable
//! - `compact`: one line per event, the default
//! - `json`: structured JSON lines for log aggregators
//!
//! Output goes to stderr so it never interleaves with chat output on stdout,
//! or to an append-only file when `logging.file` is set.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::Result;

/// Initialize the global tracing subscriber from config.
///
/// Call this once at startup before any tracing events are emitted.
/// `RUST_LOG` takes precedence over `cfg.level`. Returns an error only if
/// the log file cannot be opened; a second call is a no-op.
pub fn init_logging(cfg: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match &cfg.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match cfg.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                LogFormat::Compact => builder.compact().try_init(),
            }
        }
        None => {
            let builder = builder.with_writer(std::io::stderr);
            match cfg.format {
                LogFormat::Json => builder.json().try_init(),
                LogFormat::Pretty => builder.pretty().try_init(),
                LogFormat::Compact => builder.compact().try_init(),
            }
        }
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
    Ok(())
}
