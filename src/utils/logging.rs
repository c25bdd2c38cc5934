//! Logger setup.
//!
//! The filter comes from `NOTEFIND_LOG` using `tracing_subscriber`'s
//! `EnvFilter` syntax, e.g. `NOTEFIND_LOG=notefind::coordinator=debug`.

use anyhow::{anyhow, Context, Result};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "NOTEFIND_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Where log lines go.
#[derive(Debug, Clone)]
pub enum LogTarget {
    Stderr,
    /// Used while the TUI owns the terminal
    File(PathBuf),
}

/// Install the global subscriber. Call once, early in `main`.
pub fn init(target: LogTarget) -> Result<()> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match target {
        LogTarget::Stderr => builder
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .try_init(),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
        }
    };
    installed.map_err(|e| anyhow!("Failed to install logger: {e}"))
}
