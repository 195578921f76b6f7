//! Update callback registry.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

/// Zero-argument update callback.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// Stable index of a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UpdateHandle(pub(crate) usize);

impl UpdateHandle {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Ordered list of update callbacks.
///
/// Cancelling a callback swaps its slot for a no-op, so every other handle
/// keeps pointing at the same slot.
#[derive(Default)]
pub struct CallbackRegistry {
    slots: Mutex<Vec<Option<Callback>>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback and return its handle.
    pub fn register(&self, callback: Callback) -> UpdateHandle {
        let mut slots = self.slots.lock().expect("callback registry mutex poisoned");
        slots.push(Some(callback));
        UpdateHandle(slots.len() - 1)
    }

    /// Replace the slot with a no-op. Unknown handles are ignored.
    pub fn cancel(&self, handle: UpdateHandle) {
        let mut slots = self.slots.lock().expect("callback registry mutex poisoned");
        if let Some(slot) = slots.get_mut(handle.0) {
            *slot = None;
        }
    }

    /// Run every live callback in registration order.
    ///
    /// The slot list is snapshotted first so callbacks may register or cancel
    /// without deadlocking. A panicking callback is logged and the round goes
    /// on with the next one. Returns how many callbacks completed.
    pub fn invoke_all(&self) -> usize {
        let live: Vec<(usize, Callback)> = {
            let slots = self.slots.lock().expect("callback registry mutex poisoned");
            slots
                .iter()
                .enumerate()
                .filter_map(|(index, slot)| slot.clone().map(|cb| (index, cb)))
                .collect()
        };
        let mut completed = 0;
        for (index, callback) in &live {
            match panic::catch_unwind(AssertUnwindSafe(|| callback())) {
                Ok(()) => completed += 1,
                Err(payload) => {
                    tracing::error!(handle = *index, panic = panic_message(&*payload), "Update callback panicked");
                }
            }
        }
        completed
    }

    /// Total number of slots, cancelled ones included.
    pub fn len(&self) -> usize {
        self.slots.lock().expect("callback registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl std::fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("slots", &self.len())
            .finish()
    }
}
