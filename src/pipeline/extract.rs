//! Text extraction: page text plus positioned fragments via pdfium.
//!
//! Blocking: call from `spawn_blocking`. pdfium holds thread-local state and
//! must not run on the async worker threads.

use crate::error::Pdf2MdError;
use crate::markdown::PageContent;
use crate::pipeline::layout::{self, TextFragment};
use crate::pipeline::pdfium;
use std::path::Path;
use tracing::debug;

/// Extract the text and tables of every page, in page order.
pub fn extract_pages(path: &Path) -> Result<Vec<PageContent>, Pdf2MdError> {
    pdfium::with_pdfium("text", |engine| {
        let document = pdfium::open(engine, path)?;
        let pages = document.pages();
        debug!("Processing {} pages of {}", pages.len(), path.display());

        let mut contents = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            let number = idx + 1;
            let text = page.text().map_err(|e| Pdf2MdError::ConversionFailed {
                path: path.to_path_buf(),
                detail: format!("text layer of page {number} unreadable: {e:?}"),
            })?;

            let fragments: Vec<TextFragment> = text
                .segments()
                .iter()
                .map(|segment| {
                    let bounds = segment.bounds();
                    TextFragment::new(
                        segment.text(),
                        bounds.left().value,
                        bounds.right().value,
                        bounds.bottom().value,
                    )
                })
                .collect();

            let tables = layout::detect_tables(&fragments);
            debug!(
                "Page {}: {} fragments, {} tables",
                number,
                fragments.len(),
                tables.len()
            );

            contents.push(PageContent {
                number,
                text: text.all(),
                tables,
            });
        }

        Ok(contents)
    })
}

