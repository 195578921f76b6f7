//! Watch lifecycle and the reload / dispatch tasks.
//!
//! One reload task per resolver writes the current document. A manual
//! `reload()` shares its lock, so load and publish never interleave and
//! published versions follow the file. The task hands each published
//! snapshot to a dispatcher task over an unbounded channel, so a slow
//! callback holds up later callback rounds but never a reload.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::document::Document;
use crate::error::{Result, SettingsError};
use crate::reload::notifier::{ChangeNotifier, FsNotifier, WatchEvent};
use crate::resolver::settings::{Inner, ProcessSettings};

/// Externally visible watch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchStatus {
    Idle,
    Watching,
    Stopped,
}

pub(crate) enum WatchState {
    Idle,
    Watching(ActiveWatch),
    Stopped,
}

pub(crate) struct ActiveWatch {
    // Held to keep the subscription alive; dropping it closes the event stream.
    _notifier: Box<dyn ChangeNotifier>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl ProcessSettings {
    /// Watch the backing file and reload on every write.
    pub fn start_watch(&self) -> Result<()> {
        let poll_interval = Duration::from_millis(self.inner.watch_config.poll_interval_ms);
        self.start_watch_with(FsNotifier::new(poll_interval))
    }

    /// Watch the backing file using a custom notification source.
    pub fn start_watch_with<N: ChangeNotifier>(&self, mut notifier: N) -> Result<()> {
        let source = self.inner.source.as_ref().ok_or(SettingsError::NoSource)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SettingsError::NoRuntime)?;

        let mut state = self.inner.watch.lock().expect("watch state mutex poisoned");
        if let WatchState::Watching(active) = &*state {
            if !active.task.is_finished() {
                return Err(SettingsError::AlreadyWatching);
            }
        }

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        notifier.subscribe(&source.path, events_tx)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (published_tx, published_rx) = mpsc::unbounded_channel();
        let weak = Arc::downgrade(&self.inner);

        runtime.spawn(dispatch_updates(weak.clone(), published_rx));
        let task = runtime.spawn(reload_loop(weak, events_rx, shutdown_rx, published_tx));

        *state = WatchState::Watching(ActiveWatch {
            _notifier: Box::new(notifier),
            shutdown: shutdown_tx,
            task,
        });
        tracing::info!(path = %source.path.display(), "Settings hot reload enabled");
        Ok(())
    }

    /// Release the subscription and wait for the reload task to exit.
    ///
    /// Returns false if the handle was not watching.
    pub async fn stop_watch(&self) -> bool {
        let active = {
            let mut state = self.inner.watch.lock().expect("watch state mutex poisoned");
            match std::mem::replace(&mut *state, WatchState::Stopped) {
                WatchState::Watching(active) => active,
                other => {
                    *state = other;
                    return false;
                }
            }
        };

        let ActiveWatch {
            _notifier: notifier,
            shutdown,
            task,
        } = active;
        drop(notifier);
        let _ = shutdown.send(());
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Settings reload task ended abnormally");
        }
        tracing::info!("Settings hot reload stopped");
        true
    }

    /// Current watch state. A reload task that exited on its own, e.g. after
    /// its event stream closed, reports `Stopped`.
    pub fn watch_status(&self) -> WatchStatus {
        match &*self.inner.watch.lock().expect("watch state mutex poisoned") {
            WatchState::Idle => WatchStatus::Idle,
            WatchState::Watching(active) if active.task.is_finished() => WatchStatus::Stopped,
            WatchState::Watching(_) => WatchStatus::Watching,
            WatchState::Stopped => WatchStatus::Stopped,
        }
    }
}

/// Reload on every change event until stopped, the event stream closes, or
/// the resolver is dropped.
async fn reload_loop(
    inner: Weak<Inner>,
    mut events: mpsc::UnboundedReceiver<WatchEvent>,
    mut shutdown: oneshot::Receiver<()>,
    published: mpsc::UnboundedSender<Arc<Document>>,
) {
    loop {
        let event = tokio::select! {
            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };

        match event {
            WatchEvent::Changed => {
                let Some(settings) = inner.upgrade() else { break };
                match settings.reload_document() {
                    Ok(document) => {
                        if published.send(document).is_err() {
                            tracing::error!("Settings update dispatcher is gone; callbacks will not run");
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            version = settings.document.load().version(),
                            "Failed to reload settings. Keeping current document."
                        );
                    }
                }
            }
            WatchEvent::Error(message) => {
                tracing::error!(error = %message, "Settings watch error");
            }
        }
    }
    tracing::debug!("Settings reload task exiting");
}

/// Run one callback round per published document, in order.
async fn dispatch_updates(inner: Weak<Inner>, mut published: mpsc::UnboundedReceiver<Arc<Document>>) {
    while let Some(document) = published.recv().await {
        let Some(settings) = inner.upgrade() else { break };
        let fired = settings.callbacks.invoke_all();
        tracing::debug!(version = document.version(), callbacks = fired, "Update callbacks invoked");
    }
}
