//! Fast text backend: pdfium text layer plus geometric table detection.
//!
//! Good for born-digital PDFs. Scanned pages have no text layer and come out
//! as header-only documents; use the vision backend for those.

use super::{document_names, Converter};
use crate::error::Pdf2MdError;
use crate::markdown::render_document;
use crate::pipeline::{extract, input, pdfium};
use async_trait::async_trait;
use std::path::Path;
use tracing::info;

/// Converter backed by the pdfium text layer.
#[derive(Debug)]
pub struct TextConverter {
    _private: (),
}

impl TextConverter {
    /// # Errors
    /// [`Pdf2MdError::BackendUnavailable`] when pdfium cannot be bound.
    pub fn new() -> Result<Self, Pdf2MdError> {
        pdfium::ensure_available("text")?;
        Ok(Self { _private: () })
    }
}

#[async_trait]
impl Converter for TextConverter {
    fn name(&self) -> &str {
        "text"
    }

    async fn convert(&self, path: &Path) -> Result<String, Pdf2MdError> {
        let (title, file_name) = document_names(path);
        info!("Converting {} using text extraction", file_name);

        let source = path.to_path_buf();
        let pages = tokio::task::spawn_blocking(move || {
            input::check_pdf(&source)?;
            extract::extract_pages(&source)
        })
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("Extraction task panicked: {}", e)))??;

        info!("Successfully converted {} pages", pages.len());
        Ok(render_document(&title, &file_name, &pages))
    }
}
