//! PDF rasterisation for the vision backend.
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to call
//! from async contexts, so the work runs on the blocking pool through
//! `tokio::task::spawn_blocking`.
//!
//! The longest edge of every page image is capped at `max_rendered_pixels`
//! regardless of the page's physical size: an A0 poster would otherwise
//! produce a huge bitmap.

use crate::config::VisionSettings;
use crate::error::Pdf2MdError;
use crate::pipeline::pdfium;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Rasterise every page of a PDF.
///
/// # Returns
/// `(page_index_0based, DynamicImage)` tuples in page order.
pub async fn render_pages(
    pdf_path: &Path,
    settings: &VisionSettings,
) -> Result<Vec<(usize, DynamicImage)>, Pdf2MdError> {
    let path = pdf_path.to_path_buf();
    let max_pixels = settings.max_rendered_pixels;

    tokio::task::spawn_blocking(move || render_pages_blocking(&path, max_pixels))
        .await
        .map_err(|e| Pdf2MdError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    max_pixels: u32,
) -> Result<Vec<(usize, DynamicImage)>, Pdf2MdError> {
    pdfium::with_pdfium("vision", |engine| {
        let document = pdfium::open(engine, pdf_path)?;
        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let render_config = PdfRenderConfig::new()
            .set_target_width(max_pixels as i32)
            .set_maximum_height(max_pixels as i32);

        let mut results = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                Pdf2MdError::ConversionFailed {
                    path: pdf_path.to_path_buf(),
                    detail: format!("rasterisation failed for page {}: {:?}", idx + 1, e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            results.push((idx, image));
        }

        Ok(results)
    })
}
