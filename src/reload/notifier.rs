//! Change notification sources for hot reload.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::error::Result;

/// Event delivered to the reload task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The backing file was written or replaced.
    Changed,
    /// The notification source reported a fault. Not a data error.
    Error(String),
}

pub type WatchEventSender = mpsc::UnboundedSender<WatchEvent>;

/// Source of change notifications for a settings file.
///
/// Dropping the notifier releases the subscription.
pub trait ChangeNotifier: Send + 'static {
    /// Start delivering events for `path` into `events`.
    fn subscribe(&mut self, path: &Path, events: WatchEventSender) -> Result<()>;
}

/// Filesystem notifier backed by the `notify` crate.
///
/// Watches the parent directory so that editors replacing the file through a
/// rename are still observed.
pub struct FsNotifier {
    poll_interval: Duration,
    watcher: Option<RecommendedWatcher>,
}

impl FsNotifier {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            watcher: None,
        }
    }
}

impl ChangeNotifier for FsNotifier {
    fn subscribe(&mut self, path: &Path, events: WatchEventSender) -> Result<()> {
        let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_write(&event.kind) && names_file(&event, file_name.as_deref()) {
                        tracing::debug!(kind = ?event.kind, "Settings file change detected");
                        let _ = events.send(WatchEvent::Changed);
                    }
                }
                Err(e) => {
                    let _ = events.send(WatchEvent::Error(e.to_string()));
                }
            },
            Config::default().with_poll_interval(self.poll_interval),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), dir = %dir.display(), "Settings watcher started");

        self.watcher = Some(watcher);
        Ok(())
    }
}

fn is_write(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        _ => false,
    }
}

fn names_file(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    match file_name {
        Some(name) => event.paths.iter().any(|p| p.file_name() == Some(name)),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    #[test]
    fn test_write_kinds() {
        assert!(is_write(&EventKind::Create(CreateKind::File)));
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(!is_write(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::AccessTime))));
        assert!(!is_write(&EventKind::Remove(RemoveKind::File)));
    }

    #[test]
    fn test_events_for_other_files_are_ignored() {
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/etc/app/other.yml"));
        assert!(!names_file(&event, Some(std::ffi::OsStr::new("settings.yml"))));

        let event = Event::new(EventKind::Create(CreateKind::File)).add_path(PathBuf::from("/etc/app/settings.yml"));
        assert!(names_file(&event, Some(std::ffi::OsStr::new("settings.yml"))));
    }
}
