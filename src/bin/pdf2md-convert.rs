//! Convert one PDF into the configured output directory and exit.
//!
//! Meant for folder hooks and scripts: a non-PDF argument is skipped with
//! exit code 0 so the caller can pass every new file through blindly.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_daemon::config;
use pdf2md_daemon::pipeline::input::has_pdf_extension;
use pdf2md_daemon::{convert_to_directory, create_converter, logging, Settings};
use std::path::PathBuf;
use std::time::Duration;

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}

/// Convert a single PDF to Markdown in the configured output directory.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-convert",
    version,
    about = "Convert a single PDF to Markdown in the configured output directory"
)]
struct Cli {
    /// PDF file to convert.
    path: PathBuf,

    /// Configuration file (TOML).
    #[arg(long, env = "PDF2MD_DAEMON_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_console("warn");

    let pdf_path = std::path::absolute(&cli.path).unwrap_or(cli.path);
    if !pdf_path.exists() {
        println!("Error: File not found: {}", pdf_path.display());
        std::process::exit(1);
    }
    if !has_pdf_extension(&pdf_path) {
        println!("Skipping non-PDF file: {}", pdf_path.display());
        return Ok(());
    }

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let settings = Settings::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?
        .settings;
    let converter = create_converter(&settings).context("Failed to initialise converter")?;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    println!("Converting {} using {}...", file_name, converter.name());

    let spinner = spinner("Converting…");
    let result = convert_to_directory(converter, &pdf_path, settings.output_directory()).await;
    spinner.finish_and_clear();

    let output = result.with_context(|| format!("Conversion of {} failed", pdf_path.display()))?;
    println!("{} Saved to: {}", green("✔"), output.display());
    Ok(())
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
