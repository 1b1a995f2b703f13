//! Error types for the pdf2md-daemon library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Pdf2MdError`] — every failure the daemon can report. Startup-class
//!   variants (configuration, backend binding, watch directory) abort the
//!   process; per-file variants (corrupt PDF, vanished file, failed write)
//!   are caught at the debounce boundary and only logged.
//!
//! * [`PageError`] — **Non-fatal**: a single page failed inside the vision
//!   backend (render glitch, transient API error). The document is still
//!   assembled from the remaining pages unless every page fails.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2md-daemon library.
#[derive(Debug, Error)]
pub enum Pdf2MdError {
    // ── Configuration errors ─────────────────────────────────────────────
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a valid TOML document.
    #[error("Failed to parse configuration '{path}': {detail}")]
    ConfigParse { path: PathBuf, detail: String },

    /// A configuration value is out of range or unknown.
    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    // ── Startup errors ───────────────────────────────────────────────────
    /// The selected conversion backend cannot run on this machine.
    #[error(
        "Conversion backend '{backend}' is unavailable: {detail}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    BackendUnavailable { backend: String, detail: String },

    /// The configured watch directory does not exist.
    #[error("Watch directory does not exist: '{path}'")]
    WatchDirectoryMissing { path: PathBuf },

    /// The configured watch path exists but is not a directory.
    #[error("Watch path is not a directory: '{path}'")]
    NotADirectory { path: PathBuf },

    /// The filesystem watcher could not be started or stopped working.
    #[error("Cannot watch '{path}': {reason}")]
    WatchFailed { path: PathBuf, reason: String },

    /// The log file could not be opened or a subscriber was already set.
    #[error("Failed to initialise logging to '{path}': {reason}")]
    LoggingInit { path: PathBuf, reason: String },

    // ── Per-file errors ──────────────────────────────────────────────────
    /// The source file disappeared between detection and processing.
    #[error("File no longer exists: '{path}'")]
    FileVanished { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password; the daemon never has one.
    #[error("PDF '{path}' is encrypted and requires a password.")]
    PasswordRequired { path: PathBuf },

    /// The backend could not turn this document into Markdown.
    #[error("Failed to convert '{path}': {detail}")]
    ConversionFailed { path: PathBuf, detail: String },

    /// The vision provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Could not create the output directory or write the Markdown file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2MdError {
    /// Whether this error must stop the daemon rather than a single file.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Pdf2MdError::ConfigRead { .. }
                | Pdf2MdError::ConfigParse { .. }
                | Pdf2MdError::InvalidConfig { .. }
                | Pdf2MdError::BackendUnavailable { .. }
                | Pdf2MdError::WatchDirectoryMissing { .. }
                | Pdf2MdError::NotADirectory { .. }
                | Pdf2MdError::WatchFailed { .. }
                | Pdf2MdError::LoggingInit { .. }
        )
    }
}

/// A non-fatal error for a single page of the vision backend.
#[derive(Debug, Clone, Error)]
pub enum PageError {
    /// Page rasterisation or encoding failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// LLM call failed after retries.
    #[error("Page {page}: LLM call failed after {retries} retries: {detail}")]
    LlmFailed {
        page: usize,
        retries: u32,
        detail: String,
    },
}
