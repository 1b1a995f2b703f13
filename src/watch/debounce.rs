//! Per-path debouncing of arrival events.
//!
//! A download shows up as a burst of events for the same path. Each PDF
//! event (re)starts a timer for its path; only when the path has been quiet
//! for the whole debounce interval does the conversion run.
//!
//! ## Per-path state
//!
//! ```text
//! NoTimer ──event──▶ Scheduled ──delay──▶ Fired ──▶ NoTimer
//!                     │  ▲    └──cancel_all──▶ Cancelled ──▶ NoTimer
//!                     └──┘ event (old timer cancelled, new one scheduled)
//! ```
//!
//! Every timer is a tokio task racing `sleep(delay)` against its
//! [`CancellationToken`]. The pending map is guarded by one mutex and each
//! schedule, replace or remove happens inside a single critical section. A
//! timer carries the id it was scheduled with; if it wakes up and finds a
//! different id under its path, a newer event replaced it and it does
//! nothing. The conversion itself runs on the timer task, outside the lock.

use crate::convert::ConversionPipeline;
use crate::error::Pdf2MdError;
use crate::pipeline::input::has_pdf_extension;
use crate::watch::event::FsEvent;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct PendingConversion {
    id: u64,
    token: CancellationToken,
}

struct Inner {
    pipeline: ConversionPipeline,
    delay: Duration,
    pending: Mutex<HashMap<PathBuf, PendingConversion>>,
    next_id: AtomicU64,
}

/// Debounces PDF arrivals and hands settled files to the pipeline.
///
/// Cheap to clone; clones share the same pending map. Must be used from
/// within a tokio runtime.
#[derive(Clone)]
pub struct DebouncedHandler {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for DebouncedHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebouncedHandler")
            .field("pipeline", &self.inner.pipeline)
            .field("delay", &self.inner.delay)
            .field("pending", &self.pending_count())
            .finish()
    }
}

impl DebouncedHandler {
    pub fn new(pipeline: ConversionPipeline, delay: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                pipeline,
                delay,
                pending: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Feed one filesystem event.
    ///
    /// Returns `true` when the event was a PDF file and a timer was
    /// (re)scheduled, `false` when it was ignored.
    pub fn handle_event(&self, event: &FsEvent) -> bool {
        if event.is_dir || !has_pdf_extension(&event.path) {
            return false;
        }
        self.schedule(event.path.clone());
        true
    }

    /// Where converted files are written.
    pub fn output_dir(&self) -> &Path {
        self.inner.pipeline.output_dir()
    }

    /// Number of timers that have neither fired nor been cancelled.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Cancel every pending timer without converting. Returns how many were
    /// dropped.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.inner.pending.lock().drain().collect();
        for (path, pending) in &drained {
            pending.token.cancel();
            debug!("Cancelled pending conversion of {}", path.display());
        }
        if !drained.is_empty() {
            info!("Dropped {} pending conversion(s)", drained.len());
        }
        drained.len()
    }

    fn schedule(&self, path: PathBuf) {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let replaced = {
            let mut pending = self.inner.pending.lock();
            let previous = pending.insert(
                path.clone(),
                PendingConversion {
                    id,
                    token: token.clone(),
                },
            );
            if let Some(ref old) = previous {
                old.token.cancel();
            }
            previous.is_some()
        };

        if replaced {
            debug!("Rescheduled {} (timer reset)", path.display());
        } else {
            debug!(
                "Scheduled {} in {:.1}s",
                path.display(),
                self.inner.delay.as_secs_f64()
            );
        }

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(inner.delay) => inner.fire(path, id).await,
            }
        });
    }
}

impl Inner {
    /// Timer expiry for `path`, scheduled as `id`.
    async fn fire(&self, path: PathBuf, id: u64) {
        {
            let mut pending = self.pending.lock();
            match pending.get(&path) {
                Some(p) if p.id == id && !p.token.is_cancelled() => {
                    pending.remove(&path);
                }
                _ => return,
            }
        }

        if !path.exists() {
            warn!("File no longer exists, skipping: {}", path.display());
            return;
        }

        self.convert(&path).await;
    }

    async fn convert(&self, path: &Path) {
        match self.pipeline.run(path).await {
            Ok(output) => debug!("{} -> {}", path.display(), output.display()),
            Err(Pdf2MdError::FileVanished { .. }) => {
                warn!("File no longer exists, skipping: {}", path.display());
            }
            Err(e) => error!("Failed to convert {}: {}", path.display(), e),
        }
    }
}
