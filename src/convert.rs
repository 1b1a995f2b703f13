//! Conversion pipeline: convert one PDF and persist the Markdown.
//!
//! ## Output naming
//!
//! The output directory is flat. `report.pdf` becomes `report.md`; if that
//! name is taken the local timestamp is appended (`report_20240101_120000.md`)
//! so earlier conversions are never overwritten. The presence check and the
//! write are not atomic: two conversions of equally-named files finishing in
//! the same second may still collide.

use crate::converter::Converter;
use crate::error::Pdf2MdError;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Timestamp suffix used when `<stem>.md` already exists.
const COLLISION_SUFFIX_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Converter plus output directory; one run per settled PDF.
#[derive(Clone)]
pub struct ConversionPipeline {
    converter: Arc<dyn Converter>,
    output_dir: PathBuf,
}

impl std::fmt::Debug for ConversionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionPipeline")
            .field("converter", &self.converter.name())
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl ConversionPipeline {
    pub fn new(converter: Arc<dyn Converter>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            converter,
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Convert `input` and write the result into the output directory.
    ///
    /// Returns the path written. Nothing is written when the converter
    /// fails.
    ///
    /// # Errors
    /// Whatever the converter returns, or [`Pdf2MdError::OutputWriteFailed`].
    pub async fn run(&self, input: &Path) -> Result<PathBuf, Pdf2MdError> {
        let start = Instant::now();
        info!("Processing: {}", input.display());

        let markdown = self.converter.convert(input).await?;
        debug!(
            "{} produced {} bytes of Markdown",
            self.converter.name(),
            markdown.len()
        );

        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| Pdf2MdError::OutputWriteFailed {
                path: self.output_dir.clone(),
                source: e,
            })?;

        let output = output_path_for(&self.output_dir, input, Local::now());
        tokio::fs::write(&output, markdown.as_bytes())
            .await
            .map_err(|e| Pdf2MdError::OutputWriteFailed {
                path: output.clone(),
                source: e,
            })?;

        info!(
            "Converted {} -> {} in {}ms",
            input.display(),
            output.display(),
            start.elapsed().as_millis()
        );
        Ok(output)
    }
}

/// One-shot form of [`ConversionPipeline::run`].
///
/// # Errors
/// See [`ConversionPipeline::run`].
pub async fn convert_to_directory(
    converter: Arc<dyn Converter>,
    input: &Path,
    output_dir: &Path,
) -> Result<PathBuf, Pdf2MdError> {
    ConversionPipeline::new(converter, output_dir).run(input).await
}

/// Output path for `input` inside `output_dir`.
///
/// `<stem>.md` when free, otherwise `<stem>_<YYYYMMDD_HHMMSS>.md` stamped
/// with `now`.
pub fn output_path_for(output_dir: &Path, input: &Path, now: DateTime<Local>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());

    let plain = output_dir.join(format!("{stem}.md"));
    if !plain.exists() {
        return plain;
    }
    output_dir.join(format!("{stem}_{}.md", now.format(COLLISION_SUFFIX_FORMAT)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use regex::Regex;

    struct Fixed(&'static str);

    #[async_trait]
    impl Converter for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn convert(&self, _path: &Path) -> Result<String, Pdf2MdError> {
            Ok(self.0.to_string())
        }
    }

    struct Failing;

    #[async_trait]
    impl Converter for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn convert(&self, path: &Path) -> Result<String, Pdf2MdError> {
            Err(Pdf2MdError::CorruptPdf {
                path: path.to_path_buf(),
                detail: "bad xref".into(),
            })
        }
    }

    #[test]
    fn test_plain_name_when_free() {
        let dir = tempfile::tempdir().unwrap();
        let out = output_path_for(dir.path(), Path::new("/in/report.pdf"), Local::now());
        assert_eq!(out, dir.path().join("report.md"));
    }

    #[test]
    fn test_timestamped_name_on_collision() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("report.md"), "old").unwrap();
        let now = Local.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        let out = output_path_for(dir.path(), Path::new("/in/report.pdf"), now);
        assert_eq!(out, dir.path().join("report_20240305_140709.md"));
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        let dir = tempfile::tempdir().unwrap();
        let out = output_path_for(dir.path(), Path::new("/in/v1.2.notes.PDF"), Local::now());
        assert_eq!(out, dir.path().join("v1.2.notes.md"));
    }

    #[tokio::test]
    async fn test_run_writes_and_never_overwrites() {
        let out_dir = tempfile::tempdir().unwrap();
        let nested = out_dir.path().join("a/b");
        let pipeline = ConversionPipeline::new(Arc::new(Fixed("# Hello\n")), &nested);

        let first = pipeline.run(Path::new("/in/report.pdf")).await.unwrap();
        assert_eq!(first, nested.join("report.md"));
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "# Hello\n");

        let second = pipeline.run(Path::new("/elsewhere/report.pdf")).await.unwrap();
        let name = second.file_name().unwrap().to_string_lossy().into_owned();
        let re = Regex::new(r"^report_\d{8}_\d{6}\.md$").unwrap();
        assert!(re.is_match(&name), "unexpected name {name}");
        assert_eq!(std::fs::read_to_string(&first).unwrap(), "# Hello\n");
    }

    #[tokio::test]
    async fn test_failed_conversion_writes_nothing() {
        let out_dir = tempfile::tempdir().unwrap();
        let target = out_dir.path().join("out");
        let err = convert_to_directory(Arc::new(Failing), Path::new("/in/bad.pdf"), &target)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::CorruptPdf { .. }));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn test_unwritable_output_maps_to_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let err = convert_to_directory(Arc::new(Fixed("x")), Path::new("a.pdf"), &blocker)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2MdError::OutputWriteFailed { .. }));
    }
}
