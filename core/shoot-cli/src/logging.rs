//! File logging for the CLI.
//!
//! Logs go to a daily rolling file under `<root>/logs/` so stdout stays
//! reserved for the timer and command output.

use std::env;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_ENV: &str = "SHOOTCLOCK_DEBUG_LOG";
const LOG_FILE_PREFIX: &str = "shootclock.log";

/// Installs the global subscriber. The returned guard must live until exit
/// or buffered lines are lost.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter = filter_from_env();

    if let Err(err) = fs_err::create_dir_all(logs_dir) {
        // No log directory; fall back to stderr rather than losing everything.
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        tracing::warn!(error = %err, "Log directory unavailable; logging to stderr");
        return None;
    }

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}

fn filter_from_env() -> EnvFilter {
    let debug_enabled = env::var(DEBUG_LOG_ENV)
        .map(|value| matches!(value.as_str(), "1" | "true" | "TRUE" | "yes" | "YES"))
        .unwrap_or(false);
    if debug_enabled {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}
