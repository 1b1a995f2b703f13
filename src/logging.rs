//! Logging setup for the daemon and the one-shot tools.
//!
//! The daemon writes every event at the configured level to the log file and
//! mirrors INFO and above to stdout. `RUST_LOG` takes precedence over the
//! configured level for both outputs:
//!
//! ```bash
//! RUST_LOG=pdf2md_daemon=debug pdf2md-daemon
//! ```

use crate::config::{LogLevel, Settings};
use crate::error::Pdf2MdError;
use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Local wall-clock timestamps rendered with a chrono format string.
struct LocalTime(&'static str);

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format(self.0))
    }
}

/// Install the daemon subscriber: log file plus stdout.
///
/// Creates the log file's parent directories. Fails if the file cannot be
/// opened or a global subscriber is already installed.
pub fn init(settings: &Settings) -> Result<(), Pdf2MdError> {
    let path = settings.log_file();
    let init_err = |reason: String| Pdf2MdError::LoggingInit {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| init_err(e.to_string()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| init_err(e.to_string()))?;

    let level = settings.log_level();
    let console_level = level.max(LogLevel::Info);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_timer(LocalTime("%Y-%m-%d %H:%M:%S%.3f"))
        .with_filter(filter_or(level.as_filter()));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stdout)
        .with_target(false)
        .with_timer(LocalTime("%H:%M:%S"))
        .with_filter(filter_or(console_level.as_filter()));

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| init_err(e.to_string()))
}

/// Install a stderr-only subscriber for the one-shot tools.
pub fn init_console(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_or(default_filter))
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn filter_or(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}
