//! Diagnostic logging setup.
//!
//! Everything in the crate logs through `tracing` macros; this module only
//! decides where those events go. The interactive UI owns the terminal, so
//! it sends logs to a file. One-shot commands log to stderr.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding the `EnvFilter` directives.
pub const LOG_ENV: &str = "GEMCHAT_LOG";
pub const DEFAULT_DIRECTIVES: &str = "gemchat=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

pub(crate) fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Fails if the log file cannot be opened
/// or a subscriber is already installed.
pub fn init_tracing(target: &LogTarget) -> Result<(), Box<dyn std::error::Error>> {
    let registry = tracing_subscriber::registry().with(env_filter());

    match target {
        LogTarget::Stderr => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogTarget::File(path) => {
            let file = open_log_file(path)
                .map_err(|err| format!("Cannot open log file {}: {err}", path.display()))?;
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?
        }
    }

    Ok(())
}
