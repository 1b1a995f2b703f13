//! Daemon configuration: defaults, TOML loading and validation.
//!
//! Every knob lives in one immutable [`Settings`] value, built once at startup
//! from the documented defaults merged with an optional TOML document. Paths
//! are `~`-expanded and made absolute before anything else sees them, so the
//! rest of the crate never has to care where a value came from.
//!
//! ```toml
//! watch_directory   = "~/Downloads"
//! output_directory  = "~/AI_Context/pdfs"
//! conversion_method = "text"      # or "vision"
//! log_level         = "INFO"
//! debounce_seconds  = 2
//!
//! [vision]
//! model = "gpt-4.1-nano"
//! ```

use crate::error::Pdf2MdError;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default directory monitored for new PDF files.
pub const DEFAULT_WATCH_DIRECTORY: &str = "~/Downloads";
/// Default directory receiving converted Markdown files.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "~/AI_Context/pdfs";
/// Default log file.
pub const DEFAULT_LOG_FILE: &str = "~/.local/state/pdf2md-daemon/pdf2md-daemon.log";
/// Default quiet period before a new file is converted.
pub const DEFAULT_DEBOUNCE_SECONDS: f64 = 2.0;

/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "PDF2MD_DAEMON_CONFIG";

/// Annotated example configuration, printed by `pdf2md-daemon --example-config`.
pub const EXAMPLE_CONFIG: &str = r#"# pdf2md-daemon configuration

# Directory to monitor for new PDF files (~ is expanded)
watch_directory = "~/Downloads"

# Directory where converted Markdown files are saved (created if missing)
output_directory = "~/AI_Context/pdfs"

# Conversion backend:
#   text   - fast text extraction through pdfium (default)
#   vision - page images read by a vision LLM (needs an API key)
conversion_method = "text"

# Log file (parent directories are created)
log_file = "~/.local/state/pdf2md-daemon/pdf2md-daemon.log"

# DEBUG, INFO, WARNING, ERROR or CRITICAL
log_level = "INFO"

# Seconds without further events before a new file is converted.
# Gives downloads time to finish writing.
debounce_seconds = 2

[vision]
# provider = "openai"
# model = "gpt-4.1-nano"
max_rendered_pixels = 2000
concurrency = 4
temperature = 0.1
max_tokens = 4096
max_retries = 3
retry_backoff_ms = 500
"#;

// ── Enums ────────────────────────────────────────────────────────────────

/// Which backend turns a PDF into Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMethod {
    /// Fast text extraction through pdfium. (default)
    #[default]
    Text,
    /// Rasterised pages read by a vision LLM.
    Vision,
}

impl ConversionMethod {
    /// Every accepted method name, in documentation order.
    pub const NAMES: [&'static str; 2] = ["text", "vision"];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConversionMethod::Text => "text",
            ConversionMethod::Vision => "vision",
        }
    }
}

impl FromStr for ConversionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ConversionMethod::Text),
            "vision" => Ok(ConversionMethod::Vision),
            other => Err(format!(
                "unknown method '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log verbosity, spelled the way operators write it in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    pub const NAMES: [&'static str; 5] = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"];

    pub fn as_str(&self) -> &'static str {
        Self::NAMES[*self as usize]
    }

    /// The `tracing` filter directive for this level.
    ///
    /// `tracing` has no level above ERROR, so CRITICAL shares it.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            "CRITICAL" => Ok(LogLevel::Critical),
            other => Err(format!(
                "unknown level '{}', expected one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Vision tuning ────────────────────────────────────────────────────────

/// Tuning for the `vision` backend. Ignored by the `text` backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisionSettings {
    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None, the provider is auto-detected from API key variables.
    pub provider: Option<String>,

    /// Model identifier. If None, `gpt-4.1-nano` is used with a named provider.
    pub model: Option<String>,

    /// Longest edge of a rendered page in pixels. Default: 2000.
    ///
    /// Caps memory on oversized pages (posters, plans) regardless of their
    /// physical size.
    pub max_rendered_pixels: u32,

    /// Number of concurrent VLM calls per document. Default: 4.
    pub concurrency: usize,

    /// Sampling temperature. Default: 0.1.
    pub temperature: f32,

    /// Maximum tokens generated per page. Default: 4096.
    pub max_tokens: usize,

    /// Retries on a failed VLM call. Default: 3.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,
}

impl Default for VisionSettings {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            max_rendered_pixels: 2000,
            concurrency: 4,
            temperature: 0.1,
            max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
        }
    }
}

impl VisionSettings {
    fn validate(&self) -> Result<(), Pdf2MdError> {
        if self.max_rendered_pixels < 100 {
            return Err(invalid(
                "vision.max_rendered_pixels",
                format!("must be at least 100, got {}", self.max_rendered_pixels),
            ));
        }
        if self.concurrency == 0 {
            return Err(invalid("vision.concurrency", "must be at least 1".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(invalid(
                "vision.temperature",
                format!("must be between 0.0 and 2.0, got {}", self.temperature),
            ));
        }
        if self.max_tokens == 0 {
            return Err(invalid("vision.max_tokens", "must be at least 1".into()));
        }
        Ok(())
    }
}

// ── Settings ─────────────────────────────────────────────────────────────

/// Validated daemon settings.
///
/// Built via [`Settings::builder()`] or [`Settings::load()`]; there are no
/// setters, so a value handed to the daemon never changes underneath it.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    watch_directory: PathBuf,
    output_directory: PathBuf,
    conversion_method: ConversionMethod,
    debounce_seconds: f64,
    debounce: Duration,
    log_file: PathBuf,
    log_level: LogLevel,
    vision: VisionSettings,
}

impl Settings {
    /// Create a builder pre-filled with the documented defaults.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            watch_directory: DEFAULT_WATCH_DIRECTORY.into(),
            output_directory: DEFAULT_OUTPUT_DIRECTORY.into(),
            conversion_method: ConversionMethod::default(),
            debounce_seconds: DEFAULT_DEBOUNCE_SECONDS,
            log_file: DEFAULT_LOG_FILE.into(),
            log_level: LogLevel::default(),
            vision: VisionSettings::default(),
        }
    }

    /// The documented defaults, expanded for the current user.
    pub fn defaults() -> Result<Self, Pdf2MdError> {
        Self::builder().build()
    }

    /// Parse and validate a TOML document. Keys that are absent keep their
    /// default values.
    pub fn from_toml_str(source: &str, origin: &Path) -> Result<Self, Pdf2MdError> {
        let raw: RawSettings =
            toml::from_str(source).map_err(|e| Pdf2MdError::ConfigParse {
                path: origin.to_path_buf(),
                detail: e.to_string(),
            })?;
        raw.into_builder()?.build()
    }

    /// Load settings from `path`.
    ///
    /// A missing file is not an error: the defaults are used and the returned
    /// [`SettingsSource::Defaults`] lets the caller log a warning once logging
    /// is up. An unreadable or malformed file is an error.
    pub fn load(path: &Path) -> Result<LoadedSettings, Pdf2MdError> {
        if !path.exists() {
            return Ok(LoadedSettings {
                settings: Self::defaults()?,
                source: SettingsSource::Defaults {
                    missing: path.to_path_buf(),
                },
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| Pdf2MdError::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(LoadedSettings {
            settings: Self::from_toml_str(&text, path)?,
            source: SettingsSource::File(path.to_path_buf()),
        })
    }

    /// Directory monitored for new PDF files.
    pub fn watch_directory(&self) -> &Path {
        &self.watch_directory
    }

    /// Directory receiving the converted Markdown files.
    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn conversion_method(&self) -> ConversionMethod {
        self.conversion_method
    }

    /// Quiet period in seconds before a new file is converted.
    pub fn debounce_seconds(&self) -> f64 {
        self.debounce_seconds
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn vision(&self) -> &VisionSettings {
        &self.vision
    }
}

/// Where a [`Settings`] value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsSource {
    /// Parsed from this file.
    File(PathBuf),
    /// No file at `missing`; defaults were used.
    Defaults { missing: PathBuf },
}

/// Result of [`Settings::load`].
#[derive(Debug, Clone)]
pub struct LoadedSettings {
    pub settings: Settings,
    pub source: SettingsSource,
}

/// Builder for [`Settings`]. Paths may use `~`; they are expanded by
/// [`SettingsBuilder::build`].
#[derive(Debug, Clone)]
pub struct SettingsBuilder {
    watch_directory: PathBuf,
    output_directory: PathBuf,
    conversion_method: ConversionMethod,
    debounce_seconds: f64,
    log_file: PathBuf,
    log_level: LogLevel,
    vision: VisionSettings,
}

impl SettingsBuilder {
    pub fn watch_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.watch_directory = path.into();
        self
    }

    pub fn output_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_directory = path.into();
        self
    }

    pub fn conversion_method(mut self, method: ConversionMethod) -> Self {
        self.conversion_method = method;
        self
    }

    pub fn debounce_seconds(mut self, secs: f64) -> Self {
        self.debounce_seconds = secs;
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = level;
        self
    }

    pub fn vision(mut self, vision: VisionSettings) -> Self {
        self.vision = vision;
        self
    }

    /// Validate ranges and expand every path.
    pub fn build(self) -> Result<Settings, Pdf2MdError> {
        if !self.debounce_seconds.is_finite() || self.debounce_seconds < 0.0 {
            return Err(invalid(
                "debounce_seconds",
                format!(
                    "must be a non-negative number, got {}",
                    self.debounce_seconds
                ),
            ));
        }
        let debounce = Duration::try_from_secs_f64(self.debounce_seconds).map_err(|e| {
            invalid(
                "debounce_seconds",
                format!("{} is out of range: {}", self.debounce_seconds, e),
            )
        })?;
        self.vision.validate()?;

        Ok(Settings {
            watch_directory: expand_path("watch_directory", &self.watch_directory)?,
            output_directory: expand_path("output_directory", &self.output_directory)?,
            conversion_method: self.conversion_method,
            debounce_seconds: self.debounce_seconds,
            debounce,
            log_file: expand_path("log_file", &self.log_file)?,
            log_level: self.log_level,
            vision: self.vision,
        })
    }
}

/// The on-disk document. Enumerations stay strings here so a bad value is
/// reported against its key instead of as a generic parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    watch_directory: Option<PathBuf>,
    output_directory: Option<PathBuf>,
    conversion_method: Option<String>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    debounce_seconds: Option<f64>,
    vision: Option<VisionSettings>,
}

impl RawSettings {
    fn into_builder(self) -> Result<SettingsBuilder, Pdf2MdError> {
        let mut builder = Settings::builder();

        if let Some(dir) = self.watch_directory {
            builder = builder.watch_directory(dir);
        }
        if let Some(dir) = self.output_directory {
            builder = builder.output_directory(dir);
        }
        if let Some(method) = self.conversion_method {
            let method = method
                .parse::<ConversionMethod>()
                .map_err(|reason| invalid("conversion_method", reason))?;
            builder = builder.conversion_method(method);
        }
        if let Some(file) = self.log_file {
            builder = builder.log_file(file);
        }
        if let Some(level) = self.log_level {
            let level = level
                .parse::<LogLevel>()
                .map_err(|reason| invalid("log_level", reason))?;
            builder = builder.log_level(level);
        }
        if let Some(secs) = self.debounce_seconds {
            builder = builder.debounce_seconds(secs);
        }
        if let Some(vision) = self.vision {
            builder = builder.vision(vision);
        }

        Ok(builder)
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Fixed configuration location: `$PDF2MD_DAEMON_CONFIG`, else
/// `<config dir>/pdf2md-daemon/config.toml`.
pub fn default_config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pdf2md-daemon")
        .join("config.toml")
}

/// One-line rendering of the defaults, used when no file is found.
pub fn defaults_summary() -> String {
    format!(
        "watch_directory={}, output_directory={}, conversion_method={}, log_file={}, log_level={}, debounce_seconds={}",
        DEFAULT_WATCH_DIRECTORY,
        DEFAULT_OUTPUT_DIRECTORY,
        ConversionMethod::default(),
        DEFAULT_LOG_FILE,
        LogLevel::default(),
        DEFAULT_DEBOUNCE_SECONDS,
    )
}

/// Expand a leading `~` and make the path absolute.
fn expand_path(key: &str, path: &Path) -> Result<PathBuf, Pdf2MdError> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => {
            let home = dirs::home_dir()
                .ok_or_else(|| invalid(key, "cannot expand '~': no home directory".into()))?;
            home.join(rest)
        }
        Err(_) => path.to_path_buf(),
    };

    std::path::absolute(&expanded)
        .map_err(|e| invalid(key, format!("cannot resolve '{}': {}", expanded.display(), e)))
}

fn invalid(key: &str, reason: String) -> Pdf2MdError {
    Pdf2MdError::InvalidConfig {
        key: key.to_string(),
        reason,
    }
}
