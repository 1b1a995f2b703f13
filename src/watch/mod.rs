//! Directory watching: filesystem events in, debounced conversions out.
//!
//! ```text
//! notify thread ──FsEvent──▶ Daemon loop ──▶ DebouncedHandler
//!                                                 │ one tokio task per pending path
//!                                                 ▼
//!                                         ConversionPipeline::run
//! ```

pub mod daemon;
pub mod debounce;
pub mod event;

pub use daemon::{shutdown_signal, Daemon};
pub use debounce::DebouncedHandler;
pub use event::FsEvent;
