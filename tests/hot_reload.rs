//! Live reload behaviour.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use process_settings::{ProcessSettings, SettingsError, Value, WatchEvent, WatchStatus};
use serde_json::json;

mod common;
use common::ManualNotifier;

fn document(version: i64, log_stream: &str) -> String {
    format!(
        "- name: base.yml\n  settings:\n    honeypot:\n      log_stream: {}\n- version: {}\n  end: true\n",
        log_stream, version
    )
}

fn write(path: &Path, content: &str) {
    std::fs::write(path, content).unwrap();
}

fn scratch(version: i64, log_stream: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("process_settings.yml");
    write(&path, &document(version, log_stream));
    (dir, path)
}

fn log_stream(settings: &ProcessSettings) -> Value {
    settings.get(&["honeypot", "log_stream"]).unwrap()
}

#[tokio::test]
async fn test_write_event_publishes_new_document() {
    common::init_tracing();
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let (callback, mut fired) = common::signal();
    settings.on_update(callback, false);

    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();
    assert_eq!(settings.watch_status(), WatchStatus::Watching);

    let held = settings.document();
    write(&path, &document(2, "updated"));
    assert!(notifier.send(WatchEvent::Changed));
    common::next_signal(&mut fired, 5).await;

    assert_eq!(settings.version(), 2);
    assert_eq!(log_stream(&settings), Value::from("updated"));
    // Readers holding the old snapshot keep a complete document.
    assert_eq!(held.version(), 1);

    assert!(settings.stop_watch().await);
}

#[tokio::test]
async fn test_failed_reload_keeps_last_good_document() {
    common::init_tracing();
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let (callback, mut fired) = common::signal();
    settings.on_update(callback, false);

    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();

    write(&path, "- name: broken.yml\n  settings: {a: 1}\n");
    assert!(notifier.send(WatchEvent::Changed));
    assert!(notifier.send(WatchEvent::Error("inotify queue overflow".into())));
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(settings.version(), 1);
    assert_eq!(log_stream(&settings), Value::from("original"));
    assert!(fired.try_recv().is_err());

    // The loop survived both the data error and the watcher fault.
    write(&path, &document(3, "recovered"));
    assert!(notifier.send(WatchEvent::Changed));
    common::next_signal(&mut fired, 5).await;
    assert_eq!(log_stream(&settings), Value::from("recovered"));
    assert!(fired.try_recv().is_err());

    settings.stop_watch().await;
}

#[tokio::test]
async fn test_callbacks_run_in_order_and_cancel_keeps_handles() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            let log = log.clone();
            settings.on_update(move || log.lock().unwrap().push(name), true)
        })
        .collect();
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    assert_eq!(handles.iter().map(|h| h.index()).collect::<Vec<_>>(), vec![0, 1, 2]);

    settings.cancel_update(handles[1]);
    let (callback, mut fired) = common::signal();
    let last = settings.on_update(callback, false);
    assert_eq!(last.index(), 3);

    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();
    log.lock().unwrap().clear();

    write(&path, &document(2, "updated"));
    notifier.send(WatchEvent::Changed);
    common::next_signal(&mut fired, 5).await;
    assert_eq!(*log.lock().unwrap(), vec!["a", "c"]);

    settings.stop_watch().await;
}

#[tokio::test]
async fn test_panicking_callback_does_not_stop_later_rounds() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();

    let panicked = Arc::new(AtomicBool::new(false));
    let flag = panicked.clone();
    settings.on_update(
        move || {
            if !flag.swap(true, Ordering::SeqCst) {
                panic!("first update callback failure");
            }
        },
        false,
    );
    let rounds = Arc::new(AtomicUsize::new(0));
    let counter = rounds.clone();
    let (callback, mut fired) = common::signal();
    settings.on_update(
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            callback();
        },
        false,
    );

    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();

    for version in 2..=4 {
        write(&path, &document(version, "updated"));
        assert!(notifier.send(WatchEvent::Changed));
        common::next_signal(&mut fired, 5).await;
    }

    assert!(panicked.load(Ordering::SeqCst));
    assert_eq!(rounds.load(Ordering::SeqCst), 3);
    assert_eq!(settings.version(), 4);
    assert_eq!(settings.watch_status(), WatchStatus::Watching);
    settings.stop_watch().await;
}

#[tokio::test]
async fn test_stop_watch_releases_subscription() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();

    assert!(matches!(
        settings.start_watch_with(ManualNotifier::default()),
        Err(SettingsError::AlreadyWatching)
    ));

    assert!(settings.stop_watch().await);
    assert_eq!(settings.watch_status(), WatchStatus::Stopped);
    assert!(!notifier.send(WatchEvent::Changed));
    assert!(!settings.stop_watch().await);

    write(&path, &document(2, "updated"));
    assert_eq!(settings.version(), 1);

    // A stopped handle can watch again.
    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();
    let (callback, mut fired) = common::signal();
    settings.on_update(callback, false);
    notifier.send(WatchEvent::Changed);
    common::next_signal(&mut fired, 5).await;
    assert_eq!(settings.version(), 2);
    settings.stop_watch().await;
}

#[tokio::test]
async fn test_loop_ends_when_event_stream_closes() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();

    notifier.close();

    tokio::time::timeout(Duration::from_secs(5), async {
        while settings.watch_status() != WatchStatus::Stopped {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("reload task did not exit after the event stream closed");

    // Once the task has exited a new watch can be started.
    let restarted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match settings.start_watch_with(ManualNotifier::default()) {
                Ok(()) => break,
                Err(SettingsError::AlreadyWatching) => tokio::time::sleep(Duration::from_millis(10)).await,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
    })
    .await;
    assert!(restarted.is_ok());
    settings.stop_watch().await;
}

#[tokio::test]
async fn test_subscribers_see_latest_document() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let mut updates = settings.subscribe();
    let notifier = ManualNotifier::default();
    settings.start_watch_with(notifier.clone()).unwrap();

    write(&path, &document(7, "updated"));
    notifier.send(WatchEvent::Changed);

    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("timed out waiting for document")
        .unwrap();
    assert_eq!(updates.borrow().version(), 7);
    settings.stop_watch().await;
}

#[tokio::test]
async fn test_manual_reload_runs_callbacks_inline() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let (callback, mut fired) = common::signal();
    settings.on_update(callback, false);

    write(&path, &document(4, "manual"));
    assert_eq!(settings.reload().unwrap(), 4);
    assert!(fired.try_recv().is_ok());

    write(&path, "not: [a, list");
    assert!(settings.reload().is_err());
    assert_eq!(settings.version(), 4);
    assert!(fired.try_recv().is_err());
}

#[tokio::test]
async fn test_filesystem_watcher_reloads_on_write() {
    common::init_tracing();
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let (callback, mut fired) = common::signal();
    settings.on_update(callback, false);
    settings.start_watch().unwrap();

    write(&path, &document(2, "from disk"));
    common::next_signal(&mut fired, 10).await;
    // Editors may emit several events per save; wait for the final content.
    tokio::time::timeout(Duration::from_secs(10), async {
        while settings.version() != 2 {
            common::next_signal(&mut fired, 10).await;
        }
    })
    .await
    .expect("document was not reloaded");
    assert_eq!(log_stream(&settings), Value::from("from disk"));

    settings.stop_watch().await;
}

#[test]
fn test_watching_requires_runtime_and_source() {
    let (_dir, path) = scratch(1, "original");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    assert!(matches!(settings.start_watch(), Err(SettingsError::NoRuntime)));
    assert_eq!(settings.watch_status(), WatchStatus::Idle);

    let in_memory = ProcessSettings::from_document((*settings.document()).clone(), common::context(json!({})));
    assert!(matches!(in_memory.start_watch(), Err(SettingsError::NoSource)));
}

#[test]
fn test_concurrent_readers_see_whole_documents() {
    let (_dir, path) = scratch(1, "odd");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let context = settings.context().clone();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            let settings = settings.clone();
            let context = context.clone();
            scope.spawn(move || {
                for _ in 0..500 {
                    let snapshot = settings.document();
                    let value = process_settings::resolver::resolve(&snapshot, &context, &["honeypot", "log_stream"])
                        .and_then(Value::as_str)
                        .map(str::to_string);
                    let expected = if snapshot.version() % 2 == 1 { "odd" } else { "even" };
                    assert_eq!(value.as_deref(), Some(expected));
                }
            });
        }

        for version in 2..40 {
            let label = if version % 2 == 1 { "odd" } else { "even" };
            write(&path, &document(version, label));
            settings.reload().unwrap();
        }
    });
}

#[test]
fn test_concurrent_reloads_publish_in_file_order() {
    let (dir, path) = scratch(1, "odd");
    let settings = ProcessSettings::from_file(&path, common::context(json!({}))).unwrap();
    let done = AtomicBool::new(false);
    let last = 60;

    std::thread::scope(|scope| {
        for _ in 0..3 {
            scope.spawn(|| {
                while !done.load(Ordering::SeqCst) {
                    let _ = settings.reload();
                }
            });
        }

        scope.spawn(|| {
            let mut seen = settings.version();
            while !done.load(Ordering::SeqCst) {
                let version = settings.version();
                assert!(version >= seen, "version went back from {} to {}", seen, version);
                seen = version;
            }
        });

        // Rename into place so a reload never sees a half-written file.
        let staging = dir.path().join("staging.yml");
        for version in 2..=last {
            let label = if version % 2 == 1 { "odd" } else { "even" };
            write(&staging, &document(version, label));
            std::fs::rename(&staging, &path).unwrap();
        }
        done.store(true, Ordering::SeqCst);
    });

    assert_eq!(settings.reload().unwrap(), last);
}
