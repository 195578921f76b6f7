//! Hot reload subsystem.
//!
//! # Data Flow
//! ```text
//! notifier.rs (notify watcher on the settings file's directory)
//!     → WatchEvent::Changed / WatchEvent::Error over mpsc
//!     → coordinator.rs reload task
//!         → document loader + validation
//!         → ok:  atomic swap of Arc<Document>, snapshot sent to dispatcher
//!         → err: logged, current document stays live
//!     → dispatcher task runs update callbacks in registration order
//! ```
//!
//! # Design Decisions
//! - Exactly one reload task per resolver; it is the only writer of the live document
//! - Readers never lock: they load the current Arc and keep it for the call
//! - Stopping drops the subscription; the task also exits when its event stream closes

pub mod coordinator;
pub mod notifier;

pub use coordinator::WatchStatus;
pub use notifier::{ChangeNotifier, FsNotifier, WatchEvent, WatchEventSender};
