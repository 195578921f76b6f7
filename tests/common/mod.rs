//! Shared utilities for integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use process_settings::reload::WatchEventSender;
use process_settings::{ChangeNotifier, Result, TargetingContext, Value, WatchEvent};
use tokio::sync::mpsc;

/// Route `tracing` output through the test harness. Set `RUST_LOG` to see it.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Path of a file under `tests/fixtures`.
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Targeting context from a JSON literal.
pub fn context(json: serde_json::Value) -> TargetingContext {
    TargetingContext::from_value(Value::from(json)).expect("context must be a JSON object")
}

/// Notifier driven by the test instead of the filesystem.
#[allow(dead_code)]
#[derive(Clone, Default)]
pub struct ManualNotifier {
    sender: Arc<Mutex<Option<WatchEventSender>>>,
}

#[allow(dead_code)]
impl ManualNotifier {
    /// Deliver an event. Returns false once the reload task is gone.
    pub fn send(&self, event: WatchEvent) -> bool {
        match self.sender.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    /// Close the event stream from the notifier side.
    pub fn close(&self) {
        self.sender.lock().unwrap().take();
    }
}

impl ChangeNotifier for ManualNotifier {
    fn subscribe(&mut self, _path: &Path, events: WatchEventSender) -> Result<()> {
        *self.sender.lock().unwrap() = Some(events);
        Ok(())
    }
}

/// Callback that reports each invocation on a channel.
#[allow(dead_code)]
pub fn signal() -> (impl Fn() + Send + Sync + 'static, mpsc::UnboundedReceiver<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        move || {
            let _ = tx.send(());
        },
        rx,
    )
}

/// Wait for the next signal, failing the test after `secs`.
#[allow(dead_code)]
pub async fn next_signal(rx: &mut mpsc::UnboundedReceiver<()>, secs: u64) {
    tokio::time::timeout(Duration::from_secs(secs), rx.recv())
        .await
        .expect("timed out waiting for update callback")
        .expect("callback channel closed");
}
