//! Watch daemon: convert every PDF that lands in the watch directory.
//!
//! A thin shim over the library: load settings, install logging, build the
//! converter, then run [`Daemon`] until SIGINT/SIGTERM.

use anyhow::{Context, Result};
use clap::Parser;
use pdf2md_daemon::config::{self, EXAMPLE_CONFIG};
use pdf2md_daemon::{create_converter, logging, shutdown_signal, Daemon, Settings, SettingsSource};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const BANNER_RULE: &str = "============================================================";

const AFTER_HELP: &str = r#"CONFIGURATION:
  Settings are read from $PDF2MD_DAEMON_CONFIG, or from
  <config dir>/pdf2md-daemon/config.toml (~/.config on Linux).
  A missing file means defaults; print an annotated template with:
    pdf2md-daemon --example-config > ~/.config/pdf2md-daemon/config.toml

BACKENDS:
  text     pdfium text layer + table detection (default, offline)
  vision   page images read by a vision LLM; needs OPENAI_API_KEY,
           ANTHROPIC_API_KEY or GEMINI_API_KEY (or [vision] provider)

  Both need the pdfium library: install it system-wide or set
  PDFIUM_LIB_PATH=/path/to/libpdfium.

LOGGING:
  RUST_LOG overrides the configured log_level, e.g. RUST_LOG=pdf2md_daemon=debug
"#;

/// Watch a directory and convert new PDFs to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-daemon",
    version,
    about = "Watch a directory and convert new PDFs to Markdown",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Configuration file (TOML).
    #[arg(long, env = "PDF2MD_DAEMON_CONFIG")]
    config: Option<PathBuf>,

    /// Print an annotated example configuration and exit.
    #[arg(long)]
    example_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.example_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let loaded = match Settings::load(&config_path) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };
    let settings = loaded.settings;

    logging::init(&settings).context("Failed to initialise logging")?;

    match &loaded.source {
        SettingsSource::File(path) => info!("Loaded configuration from {}", path.display()),
        SettingsSource::Defaults { missing } => warn!(
            "Configuration file {} not found, using defaults: {}",
            missing.display(),
            config::defaults_summary()
        ),
    }

    info!("{BANNER_RULE}");
    info!("PDF to Markdown Daemon Starting");
    info!("{BANNER_RULE}");
    info!("Watch directory: {}", settings.watch_directory().display());
    info!("Output directory: {}", settings.output_directory().display());
    info!("Conversion method: {}", settings.conversion_method());
    info!("Debounce: {}s", settings.debounce_seconds());
    info!("Log file: {}", settings.log_file().display());
    info!("{BANNER_RULE}");

    let converter = create_converter(&settings).inspect_err(|e| {
        error!("Failed to initialise converter: {}", e);
    })?;
    info!("Initialized {} converter", converter.name());

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match shutdown_signal().await {
            Ok(name) => info!("Received {}, shutting down gracefully...", name),
            Err(e) => error!("Failed to install signal handlers: {}", e),
        }
        signal_token.cancel();
    });

    info!("Press Ctrl+C to stop");
    Daemon::new(&settings, converter)
        .run(shutdown)
        .await
        .inspect_err(|e| error!("{}", e))
        .context("Daemon stopped with an error")?;

    info!("Goodbye");
    Ok(())
}
