//! Process-wide settings registry.
//!
//! A convenience adapter over one [`ProcessSettings`] handle for code that
//! cannot have the handle threaded through. Prefer passing the handle.

use std::sync::{Arc, OnceLock};

use arc_swap::ArcSwapOption;

use crate::error::{Result, SettingsError};
use crate::resolver::{ProcessSettings, UpdateHandle};
use crate::value::Value;

fn slot() -> &'static ArcSwapOption<ProcessSettings> {
    static SLOT: OnceLock<ArcSwapOption<ProcessSettings>> = OnceLock::new();
    SLOT.get_or_init(ArcSwapOption::empty)
}

/// Outcome of a non-raising global lookup.
#[derive(Debug, Default)]
pub struct SafeLookup {
    /// The resolved value, if any.
    pub value: Option<Value>,
    /// Why no lookup could be attempted, e.g. nothing registered.
    pub diagnostic: Option<SettingsError>,
}

impl SafeLookup {
    pub fn into_value(self) -> Option<Value> {
        self.value
    }
}

/// Install `settings` as the process-wide instance, replacing any previous one.
pub fn set_global(settings: ProcessSettings) {
    slot().store(Some(Arc::new(settings)));
}

/// Remove the process-wide instance.
pub fn clear_global() {
    slot().store(None);
}

/// The process-wide instance.
pub fn global() -> Result<Arc<ProcessSettings>> {
    slot().load_full().ok_or(SettingsError::NotConfigured)
}

/// Strict lookup through the process-wide instance.
pub fn get<S: AsRef<str>>(path: &[S]) -> Result<Value> {
    global()?.get(path)
}

/// Non-raising lookup through the process-wide instance.
pub fn get_safe<S: AsRef<str>>(path: &[S]) -> SafeLookup {
    match global() {
        Ok(settings) => SafeLookup {
            value: settings.get_safe(path),
            diagnostic: None,
        },
        Err(e) => SafeLookup {
            value: None,
            diagnostic: Some(e),
        },
    }
}

/// Register an update callback on the process-wide instance.
pub fn on_update<F>(callback: F, invoke_immediately: bool) -> Result<UpdateHandle>
where
    F: Fn() + Send + Sync + 'static,
{
    Ok(global()?.on_update(callback, invoke_immediately))
}

/// Cancel an update callback on the process-wide instance.
pub fn cancel_update(handle: UpdateHandle) -> Result<()> {
    global()?.cancel_update(handle);
    Ok(())
}
