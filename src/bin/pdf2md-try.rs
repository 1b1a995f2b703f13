//! Try a conversion interactively: convert, preview, optionally save.
//!
//! Useful for checking a backend against a tricky document before letting
//! the daemon loose on a folder. The result is offered as `<stem>.md` next
//! to the input and only written after confirmation.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2md_daemon::config;
use pdf2md_daemon::pipeline::input::has_pdf_extension;
use pdf2md_daemon::{
    create_converter, logging, Converter, Pdf2MdError, Settings, TextConverter,
};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const PREVIEW_LINES: usize = 50;
const RULE: &str = "------------------------------------------------------------";
const DOUBLE_RULE: &str = "============================================================";

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

/// Convert a PDF, preview the Markdown and optionally save it next to the input.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2md-try",
    version,
    about = "Convert a PDF, preview the Markdown and optionally save it next to the input",
    after_help = "Example:\n  pdf2md-try ~/Downloads/sample.pdf"
)]
struct Cli {
    /// PDF file to try.
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
        println!("Error: Not a PDF file: {}", pdf_path.display());
        std::process::exit(1);
    }

    let size = std::fs::metadata(&pdf_path)
        .with_context(|| format!("Failed to stat {}", pdf_path.display()))?
        .len();
    println!("Testing PDF conversion...");
    println!("Input file: {}", pdf_path.display());
    println!("File size: {:.1} KB", size as f64 / 1024.0);
    println!();

    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let converter = load_converter(&config_path)?;

    println!();
    println!("Converting...");
    println!("{RULE}");

    let bar = spinner("Converting…");
    let result = converter.convert(&pdf_path).await;
    bar.finish_and_clear();

    let markdown = match result {
        Ok(markdown) => markdown,
        Err(e) => {
            println!();
            println!("{DOUBLE_RULE}");
            println!("{}", red("CONVERSION FAILED!"));
            println!("{DOUBLE_RULE}");
            println!();
            println!("Error: {}", failure_report(e, &pdf_path));
            println!();
            std::process::exit(1);
        }
    };

    println!();
    println!("{DOUBLE_RULE}");
    println!("{}", bold(&green("CONVERSION SUCCESSFUL!")));
    println!("{DOUBLE_RULE}");
    println!();
    println!("Generated {} characters of markdown", markdown.chars().count());
    println!();
    print_preview(&markdown);

    let output_path = sibling_markdown_path(&pdf_path);
    if confirm(&format!("\nSave to {}? [y/N]: ", output_path.display()))? {
        std::fs::write(&output_path, &markdown)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        println!("{} Saved to: {}", green("✔"), output_path.display());
    } else {
        println!("Not saved.");
    }
    Ok(())
}

/// The configured backend, or the text backend when the configuration
/// cannot be loaded.
fn load_converter(config_path: &Path) -> Result<Arc<dyn Converter>> {
    match Settings::load(config_path) {
        Ok(loaded) => {
            println!("Using converter: {}", loaded.settings.conversion_method());
            create_converter(&loaded.settings).context("Failed to initialise converter")
        }
        Err(e) => {
            println!("Warning: Could not load config: {e}");
            println!("Using default converter: text");
            let converter = TextConverter::new().context("Failed to initialise converter")?;
            Ok(Arc::new(converter))
        }
    }
}

/// The error with its full cause chain, one `Caused by:` block per source.
fn failure_report(e: Pdf2MdError, pdf_path: &Path) -> String {
    let err = anyhow::Error::new(e).context(format!("Converting {}", pdf_path.display()));
    format!("{err:?}")
}

fn print_preview(markdown: &str) {
    let lines: Vec<&str> = markdown.split('\n').collect();
    println!("Preview (first {PREVIEW_LINES} lines):");
    println!("{RULE}");
    for line in lines.iter().take(PREVIEW_LINES) {
        println!("{line}");
    }
    if lines.len() > PREVIEW_LINES {
        println!();
        println!("... ({} more lines)", lines.len() - PREVIEW_LINES);
    }
    println!();
    println!("{RULE}");
}

fn sibling_markdown_path(pdf_path: &Path) -> PathBuf {
    let stem = pdf_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    pdf_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("{stem}.md"))
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt}");
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut answer = String::new();
    io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_report_includes_every_cause() {
        let e = Pdf2MdError::ConfigRead {
            path: PathBuf::from("/etc/pdf2md.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        let report = failure_report(e, Path::new("/tmp/in.pdf"));

        assert!(report.starts_with("Converting /tmp/in.pdf"), "{report}");
        assert!(report.contains("Caused by:"), "{report}");
        assert!(report.contains("Failed to read configuration"), "{report}");
        assert!(report.lines().any(|l| l.trim().ends_with("access denied")), "{report}");
    }

    #[test]
    fn sibling_path_replaces_extension() {
        assert_eq!(
            sibling_markdown_path(Path::new("/docs/Report.PDF")),
            PathBuf::from("/docs/Report.md")
        );
    }
}
