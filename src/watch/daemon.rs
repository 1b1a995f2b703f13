//! Process lifecycle: watch until told to stop, then shut down cleanly.

use crate::config::Settings;
use crate::convert::ConversionPipeline;
use crate::converter::Converter;
use crate::error::Pdf2MdError;
use crate::watch::debounce::DebouncedHandler;
use crate::watch::event::FsEvent;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long shutdown waits for the watcher thread to stop.
const WATCHER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The watch daemon: one watch directory, one debounced handler.
#[derive(Debug)]
pub struct Daemon {
    watch_dir: PathBuf,
    handler: DebouncedHandler,
}

impl Daemon {
    pub fn new(settings: &Settings, converter: Arc<dyn Converter>) -> Self {
        let pipeline = ConversionPipeline::new(converter, settings.output_directory());
        Self {
            watch_dir: settings.watch_directory().to_path_buf(),
            handler: DebouncedHandler::new(pipeline, settings.debounce()),
        }
    }

    pub fn handler(&self) -> &DebouncedHandler {
        &self.handler
    }

    /// Watch until `shutdown` is cancelled.
    ///
    /// On return the watcher is stopped and every pending timer has been
    /// cancelled; conversions already running are not awaited.
    ///
    /// # Errors
    /// * [`Pdf2MdError::WatchDirectoryMissing`] / [`Pdf2MdError::NotADirectory`]
    ///   before anything is watched.
    /// * [`Pdf2MdError::OutputWriteFailed`] when the output directory cannot
    ///   be created.
    /// * [`Pdf2MdError::WatchFailed`] when observation cannot start or breaks
    ///   while running (e.g. the watch directory was deleted).
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), Pdf2MdError> {
        validate_watch_directory(&self.watch_dir)?;

        let output_dir = self.handler.output_dir();
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| Pdf2MdError::OutputWriteFailed {
                path: output_dir.to_path_buf(),
                source: e,
            })?;

        let (tx, mut rx) = mpsc::channel::<notify::Result<Event>>(EVENT_CHANNEL_CAPACITY);
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.blocking_send(res);
            },
            Config::default(),
        )
        .map_err(|e| self.watch_failed(e.to_string()))?;
        watcher
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| self.watch_failed(e.to_string()))?;

        info!("Watching {} for new PDFs", self.watch_dir.display());

        let outcome = loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                msg = rx.recv() => match msg {
                    Some(Ok(event)) => {
                        if let Err(e) = self.dispatch(&event) {
                            break Err(e);
                        }
                    }
                    Some(Err(e)) => {
                        error!("Watcher error: {}", e);
                        break Err(self.watch_failed(e.to_string()));
                    }
                    None => {
                        error!("Watcher event channel closed");
                        break Err(self.watch_failed("event channel closed".to_string()));
                    }
                }
            }
        };

        // Unblock a watcher thread stuck on a full channel before joining it.
        drop(rx);
        stop_watcher(watcher).await;
        self.handler.cancel_all();
        info!("Daemon stopped");
        outcome
    }

    fn dispatch(&self, event: &Event) -> Result<(), Pdf2MdError> {
        if matches!(event.kind, EventKind::Remove(_))
            && event.paths.iter().any(|p| p == &self.watch_dir)
        {
            error!("Watch directory removed: {}", self.watch_dir.display());
            return Err(self.watch_failed("watch directory was removed".to_string()));
        }

        for arrival in FsEvent::from_notify(event) {
            if self.handler.handle_event(&arrival) {
                info!("New PDF detected: {}", arrival.path.display());
            } else {
                debug!("Ignoring {}", arrival.path.display());
            }
        }
        Ok(())
    }

    fn watch_failed(&self, reason: String) -> Pdf2MdError {
        Pdf2MdError::WatchFailed {
            path: self.watch_dir.clone(),
            reason,
        }
    }
}

fn validate_watch_directory(path: &Path) -> Result<(), Pdf2MdError> {
    if !path.exists() {
        return Err(Pdf2MdError::WatchDirectoryMissing {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Err(Pdf2MdError::NotADirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Drop the watcher off the async threads, bounded by [`WATCHER_STOP_TIMEOUT`].
async fn stop_watcher(watcher: RecommendedWatcher) {
    let stop = tokio::task::spawn_blocking(move || drop(watcher));
    match tokio::time::timeout(WATCHER_STOP_TIMEOUT, stop).await {
        Ok(Ok(())) => debug!("Watcher stopped"),
        Ok(Err(e)) => warn!("Watcher shutdown task failed: {}", e),
        Err(_) => warn!(
            "Watcher did not stop within {}s",
            WATCHER_STOP_TIMEOUT.as_secs()
        ),
    }
}

/// Resolve when the process receives SIGINT or SIGTERM (Ctrl-C elsewhere).
///
/// Returns the name of the signal received.
///
/// # Errors
/// When a signal handler cannot be installed.
#[cfg(unix)]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Resolve on Ctrl-C.
///
/// # Errors
/// When the Ctrl-C handler cannot be installed.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl-C")
}
