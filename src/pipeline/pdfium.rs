//! pdfium binding and document loading.
//!
//! pdfium keeps global library state: binding initialises it and dropping the
//! last [`Pdfium`] tears it down. Two conversions binding and dropping at the
//! same time would race on that state, so every pdfium session in this crate
//! runs inside [`with_pdfium`], which holds one process-wide lock.

use crate::error::Pdf2MdError;
use parking_lot::Mutex;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Path to an existing pdfium shared library. When unset the system library
/// is used.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

static PDFIUM_SESSION: Mutex<()> = parking_lot::const_mutex(());

/// Bind the pdfium library. `backend` names the caller in the error.
pub fn bind(backend: &str) -> Result<Pdfium, Pdf2MdError> {
    let bindings = match std::env::var_os(PDFIUM_LIB_PATH_ENV).filter(|p| !p.is_empty()) {
        Some(path) => Pdfium::bind_to_library(PathBuf::from(path)),
        None => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| Pdf2MdError::BackendUnavailable {
        backend: backend.to_string(),
        detail: format!("{e:?}"),
    })?;

    Ok(Pdfium::new(bindings))
}

/// Check that pdfium can be bound, then release it.
pub fn ensure_available(backend: &str) -> Result<(), Pdf2MdError> {
    with_pdfium(backend, |_| Ok(()))
}

/// Run `f` with a freshly bound pdfium, serialised against every other
/// session in the process.
pub fn with_pdfium<T>(
    backend: &str,
    f: impl FnOnce(&Pdfium) -> Result<T, Pdf2MdError>,
) -> Result<T, Pdf2MdError> {
    let _session = PDFIUM_SESSION.lock();
    let pdfium = bind(backend)?;
    f(&pdfium)
}

/// Open a PDF without a password.
pub fn open<'a>(pdfium: &'a Pdfium, path: &Path) -> Result<PdfDocument<'a>, Pdf2MdError> {
    pdfium.load_pdf_from_file(path, None).map_err(|e| {
        let detail = format!("{e:?}");
        if detail.contains("Password") || detail.contains("password") {
            Pdf2MdError::PasswordRequired {
                path: path.to_path_buf(),
            }
        } else {
            Pdf2MdError::CorruptPdf {
                path: path.to_path_buf(),
                detail,
            }
        }
    })
}
