//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pdf2md_daemon::{Converter, Pdf2MdError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Converter that records every call and can be switched into failure mode.
#[derive(Default)]
pub struct RecordingConverter {
    calls: Mutex<Vec<PathBuf>>,
    failing: AtomicBool,
}

impl RecordingConverter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Converter for RecordingConverter {
    fn name(&self) -> &str {
        "recording"
    }

    async fn convert(&self, path: &Path) -> Result<String, Pdf2MdError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        if self.failing.load(Ordering::SeqCst) {
            return Err(Pdf2MdError::ConversionFailed {
                path: path.to_path_buf(),
                detail: "backend exploded".into(),
            });
        }
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        Ok(format!("# {stem}\n\n*Converted from: {}*\n", path.display()))
    }
}

/// Sorted file names in `dir`; empty when `dir` does not exist.
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Write a small file that starts with the PDF magic.
pub fn touch_pdf(path: &Path) {
    std::fs::write(path, b"%PDF-1.4\n%fake\n").unwrap();
}
