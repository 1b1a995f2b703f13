//! PDF stages used by the conversion backends.
//!
//! Each submodule implements exactly one step, so a backend is a short
//! composition of them and each step is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! text:    input ──▶ pdfium ──▶ extract ──▶ layout ──▶ markdown
//! vision:  input ──▶ pdfium ──▶ render ──▶ encode ──▶ llm ──▶ postprocess ──▶ markdown
//! ```
//!
//! 1. [`input`]   — check the file is still there and starts with `%PDF`
//! 2. [`pdfium`]  — bind the pdfium library and open documents; every pdfium
//!    session is serialised behind one process-wide lock
//! 3. [`extract`] — page text and positioned text fragments (blocking)
//! 4. [`layout`]  — group fragments into rows and columns to find tables
//! 5. [`render`]  — rasterise pages for the vision backend (blocking)
//! 6. [`encode`]  — PNG-encode and base64-wrap each page image
//! 7. [`llm`]     — drive the VLM call with retry/backoff
//! 8. [`postprocess`] — deterministic cleanup of VLM output

pub mod encode;
pub mod extract;
pub mod input;
pub mod layout;
pub mod llm;
pub mod pdfium;
pub mod postprocess;
pub mod render;
