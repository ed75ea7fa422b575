//! Logging infrastructure for step2glb.
//!
//! This module provides:
//! - Per-run loggers with optional log file + console callback output
//! - Compact mode that keeps external tool chatter in a tail buffer
//! - Integration with the `tracing` ecosystem
//!
//! # Example
//!
//! ```no_run
//! use step2glb_core::logging::{JobLoggerBuilder, LogLevel};
//!
//! let logger = JobLoggerBuilder::new("bracket")
//!     .log_dir("/tmp/step2glb-logs")
//!     .level(LogLevel::Debug)
//!     .callback(Box::new(|line: &str| eprintln!("{line}")))
//!     .build()
//!     .unwrap();
//!
//! logger.phase("Export");
//! logger.command("freecadcmd -c ...");
//! logger.success("Export completed");
//! ```

mod job_logger;
mod types;

pub use job_logger::{JobLogger, JobLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize global tracing subscriber for application-wide logging.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
///
/// Should be called once at application startup.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false),
        )
        .with(filter)
        .init();
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

/// Convert LogLevel to filter string.
fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
