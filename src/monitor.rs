//! Monitor: the watch loop feeding document changes into the session.
//!
//! Change notifications arrive on a bounded channel and are handled one tick
//! at a time. A burst of notifications collapses into a single tick because
//! every tick re-reads the whole document.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use quill_core::{config::WatchConfig, error::QuillError, traits::Provider};
use quill_transcript::{Session, TickOutcome};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Watches one document and answers every completed user turn in it.
pub struct Monitor {
    session: Session,
    provider: Box<dyn Provider>,
    watch: WatchConfig,
}

impl Monitor {
    pub fn new(session: Session, provider: Box<dyn Provider>, watch: WatchConfig) -> Self {
        Self {
            session,
            provider,
            watch,
        }
    }

    /// Run until Ctrl-C.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::channel::<()>(self.watch.queue_capacity.max(1));
        // Dropping the watcher stops notifications, so it lives as long as the loop.
        let _watcher = start_watcher(self.session.path(), tx)?;

        info!(
            "init: monitoring {} | format: {} | provider: {}",
            self.session.path().display(),
            self.session.format().display_name(),
            self.provider.name(),
        );

        loop {
            tokio::select! {
                Some(()) = rx.recv() => {
                    self.coalesce(&mut rx).await;
                    self.handle_tick().await;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Wait out the debounce window, then drop notifications queued meanwhile.
    async fn coalesce(&self, rx: &mut mpsc::Receiver<()>) {
        if self.watch.debounce_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.watch.debounce_ms)).await;
        }
        let mut dropped = 0usize;
        while rx.try_recv().is_ok() {
            dropped += 1;
        }
        debug!("detect: file change ({dropped} more coalesced)");
    }

    async fn handle_tick(&mut self) {
        match self.session.tick(self.provider.as_ref()).await {
            Ok(TickOutcome::Replied {
                reply,
                context_turns,
            }) => {
                debug!(
                    "response: {} tokens from {} for {context_turns} turns",
                    reply
                        .metadata
                        .tokens_used
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "?".into()),
                    reply.metadata.model.as_deref().unwrap_or("unknown model"),
                );
            }
            Ok(_) => {}
            Err(e) => error!("error: {e}"),
        }
    }
}

/// Directory to watch and the file name to filter on.
///
/// The parent directory is watched rather than the file itself so editors
/// that save by writing a new file and renaming it keep triggering ticks.
pub(crate) fn watch_target(document: &Path) -> Result<(PathBuf, OsString), QuillError> {
    let name = document
        .file_name()
        .ok_or_else(|| {
            QuillError::Watch(format!("{} does not name a file", document.display()))
        })?
        .to_os_string();
    let dir = match document.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name))
}

/// Whether a notifier event is a write to (or re-creation of) the document.
pub(crate) fn is_document_change(event: &Event, name: &OsString) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(name.as_os_str()))
}

fn start_watcher(
    document: &Path,
    tx: mpsc::Sender<()>,
) -> Result<RecommendedWatcher, QuillError> {
    let (dir, name) = watch_target(document)?;

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<Event, notify::Error>| match res {
            Ok(event) if is_document_change(&event, &name) => {
                // Runs on the notifier's own thread; blocking here only
                // back-pressures the notifier while a tick is in flight.
                let _ = tx.blocking_send(());
            }
            Ok(_) => {}
            Err(e) => warn!("watch: notifier error: {e}"),
        },
        notify::Config::default(),
    )
    .map_err(|e| QuillError::Watch(format!("failed to start file notifier: {e}")))?;

    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .map_err(|e| QuillError::Watch(format!("failed to watch {}: {e}", dir.display())))?;

    Ok(watcher)
}
