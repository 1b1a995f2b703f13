//! # pdf2md-daemon
//!
//! Watch a directory for newly-arrived PDFs and convert each one to Markdown.
//!
//! ## Why a daemon?
//!
//! PDFs land in `~/Downloads` all day long. Converting them by hand before
//! they can be grepped, diffed or fed to an assistant is friction; this crate
//! does it as soon as a download settles, and never overwrites an earlier
//! conversion.
//!
//! ## Pipeline Overview
//!
//! ```text
//! notify event
//!  │
//!  ├─ 1. Filter    non-directory, *.pdf (any case)
//!  ├─ 2. Debounce  per-path timer, reset by every new event
//!  ├─ 3. Convert   text backend (pdfium) or vision backend (VLM)
//!  ├─ 4. Name      <stem>.md, or <stem>_<YYYYMMDD_HHMMSS>.md when taken
//!  └─ 5. Write     UTF-8 into the flat output directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2md_daemon::{create_converter, Daemon, Settings};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::builder().watch_directory("~/Downloads").build()?;
//!     let converter = create_converter(&settings)?;
//!     let shutdown = CancellationToken::new();
//!     Daemon::new(&settings, converter).run(shutdown).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2md-daemon`, `pdf2md-convert` and `pdf2md-try` binaries (clap + anyhow + indicatif) |
//!
//! Disable `cli` when embedding only the library:
//! ```toml
//! pdf2md-daemon = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod converter;
pub mod error;
pub mod logging;
pub mod markdown;
pub mod pipeline;
pub mod prompts;
pub mod watch;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ConversionMethod, LoadedSettings, LogLevel, Settings, SettingsBuilder, SettingsSource,
    VisionSettings,
};
pub use convert::{convert_to_directory, output_path_for, ConversionPipeline};
pub use converter::{create_converter, Converter, TextConverter, VisionConverter};
pub use error::{PageError, Pdf2MdError};
pub use watch::{shutdown_signal, Daemon, DebouncedHandler, FsEvent};
