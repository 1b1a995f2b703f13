//! The converter capability: the seam between orchestration and extraction.
//!
//! Everything above this module (debouncing, naming, writing) only ever sees
//! `Arc<dyn Converter>`. Backends are chosen once at startup by
//! [`create_converter`]; a backend whose runtime dependency is missing fails
//! there, not at the first file.
//!
//! | Method   | Backend              | Needs                         |
//! |----------|----------------------|-------------------------------|
//! | `text`   | [`TextConverter`]    | pdfium                        |
//! | `vision` | [`VisionConverter`]  | pdfium + a vision LLM API key |

mod text;
mod vision;

pub use text::TextConverter;
pub use vision::VisionConverter;

use crate::config::{ConversionMethod, Settings};
use crate::error::Pdf2MdError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Turns one PDF file into a Markdown document.
///
/// Implementations must tolerate repeated calls; any expensive one-time setup
/// happens lazily inside the instance and is cached for its lifetime.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Stable identifier used in logs.
    fn name(&self) -> &str;

    /// Convert the PDF at `path` to Markdown.
    async fn convert(&self, path: &Path) -> Result<String, Pdf2MdError>;
}

/// Build the backend selected by `settings`.
///
/// # Errors
/// [`Pdf2MdError::BackendUnavailable`] when the pdfium library cannot be bound.
pub fn create_converter(settings: &Settings) -> Result<Arc<dyn Converter>, Pdf2MdError> {
    let converter: Arc<dyn Converter> = match settings.conversion_method() {
        ConversionMethod::Text => Arc::new(TextConverter::new()?),
        ConversionMethod::Vision => Arc::new(VisionConverter::new(settings.vision().clone())?),
    };
    Ok(converter)
}

/// `(title, file name)` of a source document: the stem becomes the `#`
/// heading, the file name goes into the byline.
pub(crate) fn document_names(path: &Path) -> (String, String) {
    let title = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    (title, file_name)
}
