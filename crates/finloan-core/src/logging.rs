//! Logging infrastructure for FinLoan.
//!
//! Structured logging using the `tracing` ecosystem. The terminal is owned by
//! the TUI while the wizard runs, so log output goes to a daily-rolling JSON
//! lines file under `~/.finloan/logs/` instead of the console.
//!
//! ## Example
//!
//! ```no_run
//! use finloan_core::logging;
//!
//! let _guard = logging::init_logging(None, false).expect("logging init");
//!
//! tracing::info!("wizard started");
//! tracing::debug!(field = "loan_amount", "validation scheduled");
//! ```

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::error::{FinloanError, Result};

/// Log file name prefix inside the log directory.
pub const LOG_FILE_NAME: &str = "finloan.log";

/// Guard that must be held to ensure log flushing on shutdown.
///
/// Keep this guard alive for the lifetime of the application.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the FinLoan logging system.
///
/// # Arguments
///
/// * `log_dir` - Optional custom log directory. Defaults to `~/.finloan/logs/`
/// * `verbose` - If true, sets log level to DEBUG. Otherwise uses INFO.
///
/// `RUST_LOG` overrides the computed filter when set.
pub fn init_logging(log_dir: Option<PathBuf>, verbose: bool) -> Result<LogGuard> {
    let log_dir = match log_dir {
        Some(dir) => dir,
        None => default_log_dir()?,
    };

    std::fs::create_dir_all(&log_dir).map_err(|e| FinloanError::DirectoryCreation {
        path: log_dir.clone(),
        source: e,
    })?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "finloan={default_level},finloan_core={default_level},finloan_form={default_level},finloan_tui={default_level}"
        ))
    });

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .json()
        .with_span_events(FmtSpan::CLOSE)
        .with_current_span(true)
        .with_span_list(true)
        .with_file(verbose)
        .with_line_number(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| FinloanError::internal(format!("logging already initialized: {e}")))?;

    tracing::debug!(log_dir = %log_dir.display(), verbose, "logging initialized");

    Ok(LogGuard {
        _file_guard: Some(file_guard),
    })
}

/// Initialize minimal console-only logging for testing.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

/// Root of all FinLoan state: `~/.finloan/`.
pub fn finloan_home() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".finloan"))
        .ok_or_else(|| FinloanError::internal("home directory could not be determined"))
}

/// Get the default log directory path: `~/.finloan/logs/`.
pub fn default_log_dir() -> Result<PathBuf> {
    Ok(finloan_home()?.join("logs"))
}
