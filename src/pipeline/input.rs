//! Input checks: make sure a detected file is still a readable PDF.
//!
//! Files in a downloads folder change under our feet: a browser may still be
//! renaming its partial file, or the user may already have deleted it. We
//! check existence, readability and the `%PDF` magic bytes before handing the
//! path to pdfium, so callers get a meaningful error instead of a pdfium one.

use crate::error::Pdf2MdError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Whether the path has a `.pdf` extension, ignoring case.
pub fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn check_pdf(path: &Path) -> Result<(), Pdf2MdError> {
    let mut file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Pdf2MdError::FileVanished {
                path: path.to_path_buf(),
            });
        }
        Err(e) => {
            return Err(Pdf2MdError::ConversionFailed {
                path: path.to_path_buf(),
                detail: format!("cannot open file: {e}"),
            });
        }
    };

    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) if &magic == b"%PDF" => {
            debug!("Verified PDF header: {}", path.display());
            Ok(())
        }
        Ok(()) => Err(Pdf2MdError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        }),
        Err(_) => Err(Pdf2MdError::ConversionFailed {
            path: path.to_path_buf(),
            detail: "file is too short to be a PDF".into(),
        }),
    }
}
