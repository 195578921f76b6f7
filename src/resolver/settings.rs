//! The `ProcessSettings` resolver handle.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::config::{SettingsConfig, WatchConfig};
use crate::document::{load_document, Document, DocumentFormat};
use crate::error::{Result, SettingsError};
use crate::reload::coordinator::WatchState;
use crate::resolver::callbacks::{CallbackRegistry, UpdateHandle};
use crate::resolver::lookup::{resolve, SettingPath};
use crate::targeting::TargetingContext;
use crate::value::Value;

/// Backing file of a resolver.
#[derive(Debug, Clone)]
pub(crate) struct Source {
    pub path: PathBuf,
    pub format: DocumentFormat,
}

pub(crate) struct Inner {
    pub source: Option<Source>,
    pub document: ArcSwap<Document>,
    pub context: TargetingContext,
    pub callbacks: CallbackRegistry,
    pub updates: watch::Sender<Arc<Document>>,
    pub watch_config: WatchConfig,
    pub watch: Mutex<WatchState>,
    // Held across load and publish so concurrent reloads publish in file order.
    pub reload_lock: Mutex<()>,
}

impl Inner {
    /// Reload from the backing file and publish on success.
    ///
    /// On error nothing is published and the current snapshot stays live.
    /// The watch task and manual reloads both come through here, one at a time.
    pub fn reload_document(&self) -> Result<Arc<Document>> {
        let source = self.source.as_ref().ok_or(SettingsError::NoSource)?;
        let _guard = self.reload_lock.lock().expect("reload mutex poisoned");
        let document = load_document(&source.path, source.format)?;
        Ok(self.publish(document))
    }

    /// Swap in a new snapshot. Readers holding the old one keep it.
    pub fn publish(&self, document: Document) -> Arc<Document> {
        let document = Arc::new(document);
        let previous = self.document.swap(document.clone());
        self.updates.send_replace(document.clone());
        tracing::info!(
            previous_version = previous.version(),
            version = document.version(),
            layers = document.len(),
            "Settings document published"
        );
        document
    }
}

/// Resolves settings paths against the live document for a fixed targeting context.
///
/// Cloning is cheap; clones share the document, the callback registry and
/// the watch task.
#[derive(Clone)]
pub struct ProcessSettings {
    pub(crate) inner: Arc<Inner>,
}

impl ProcessSettings {
    /// Load a settings file; the format follows the file extension.
    pub fn from_file(path: impl AsRef<Path>, context: TargetingContext) -> Result<Self> {
        let path = path.as_ref();
        Self::from_file_with_format(path, DocumentFormat::from_path(path), context)
    }

    /// Load a settings file with an explicit format.
    pub fn from_file_with_format(
        path: impl AsRef<Path>,
        format: DocumentFormat,
        context: TargetingContext,
    ) -> Result<Self> {
        Self::load(path.as_ref(), format, context, WatchConfig::default())
    }

    /// Build from bootstrap configuration. Starts watching when
    /// `watch.enabled` is set, which requires a running Tokio runtime.
    pub fn from_config(config: &SettingsConfig) -> Result<Self> {
        let format = config
            .format
            .unwrap_or_else(|| DocumentFormat::from_path(&config.path));
        let settings = Self::load(&config.path, format, config.targeting_context()?, config.watch.clone())?;
        if config.watch.enabled {
            settings.start_watch()?;
        }
        Ok(settings)
    }

    /// Wrap an in-memory document. Such a handle cannot reload or watch.
    pub fn from_document(document: Document, context: TargetingContext) -> Self {
        Self::build(None, document, context, WatchConfig::default())
    }

    fn load(path: &Path, format: DocumentFormat, context: TargetingContext, watch_config: WatchConfig) -> Result<Self> {
        let document = load_document(path, format)?;
        tracing::info!(
            path = %path.display(),
            version = document.version(),
            layers = document.len(),
            "Settings document loaded"
        );
        let source = Source {
            path: path.to_path_buf(),
            format,
        };
        Ok(Self::build(Some(source), document, context, watch_config))
    }

    fn build(source: Option<Source>, document: Document, context: TargetingContext, watch_config: WatchConfig) -> Self {
        let document = Arc::new(document);
        let (updates, _) = watch::channel(document.clone());
        Self {
            inner: Arc::new(Inner {
                source,
                document: ArcSwap::new(document),
                context,
                callbacks: CallbackRegistry::new(),
                updates,
                watch_config,
                watch: Mutex::new(WatchState::Idle),
                reload_lock: Mutex::new(()),
            }),
        }
    }

    /// Resolve a path; missing paths are a `NotFound` error.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Result<Value> {
        self.get_safe(path).ok_or_else(|| SettingsError::NotFound {
            path: SettingPath(path).to_string(),
        })
    }

    /// Resolve a path; missing paths are `None`.
    pub fn get_safe<S: AsRef<str>>(&self, path: &[S]) -> Option<Value> {
        let document = self.inner.document.load();
        let found = resolve(&document, &self.inner.context, path).cloned();
        if found.is_none() {
            tracing::debug!(path = %SettingPath(path), version = document.version(), "Setting not found");
        }
        found
    }

    /// Resolve a path and convert the value into `T`.
    pub fn get_as<T: DeserializeOwned, S: AsRef<str>>(&self, path: &[S]) -> Result<T> {
        let value = self.get(path)?;
        serde_json::to_value(&value)
            .and_then(serde_json::from_value)
            .map_err(|source| SettingsError::Conversion {
                path: SettingPath(path).to_string(),
                source,
            })
    }

    /// Current document snapshot.
    pub fn document(&self) -> Arc<Document> {
        self.inner.document.load_full()
    }

    pub fn version(&self) -> i64 {
        self.inner.document.load().version()
    }

    pub fn context(&self) -> &TargetingContext {
        &self.inner.context
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.inner.source.as_ref().map(|s| s.path.as_path())
    }

    /// Register a callback fired after every successful reload.
    ///
    /// With `invoke_immediately` the callback also runs once before this
    /// returns.
    pub fn on_update<F>(&self, callback: F, invoke_immediately: bool) -> UpdateHandle
    where
        F: Fn() + Send + Sync + 'static,
    {
        let callback: Arc<dyn Fn() + Send + Sync> = Arc::new(callback);
        let handle = self.inner.callbacks.register(callback.clone());
        if invoke_immediately {
            callback();
        }
        handle
    }

    pub fn cancel_update(&self, handle: UpdateHandle) {
        self.inner.callbacks.cancel(handle);
    }

    /// Receiver that always holds the latest published document.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Document>> {
        self.inner.updates.subscribe()
    }

    /// Reload from disk now and run the update callbacks inline.
    ///
    /// Returns the new version. On error the previous document stays live
    /// and no callback runs.
    pub fn reload(&self) -> Result<i64> {
        let document = self.inner.reload_document()?;
        let fired = self.inner.callbacks.invoke_all();
        tracing::debug!(version = document.version(), callbacks = fired, "Update callbacks invoked");
        Ok(document.version())
    }
}

impl std::fmt::Debug for ProcessSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSettings")
            .field("path", &self.path())
            .field("version", &self.version())
            .field("context", &self.inner.context)
            .field("callbacks", &self.inner.callbacks)
            .finish()
    }
}
