//! Resolution subsystem.
//!
//! # Data Flow
//! ```text
//! get(path)
//!     → load current Arc<Document> (lock-free)
//!     → for each data layer in order: active for context? lookup path in settings
//!     → last successful lookup wins
//!     → Value / NotFound
//! ```
//!
//! # Design Decisions
//! - Overrides apply per leaf path; subtrees are never merged
//! - Every active layer is consulted; no short-circuit on first hit
//! - The targeting context is fixed at construction

pub mod callbacks;
pub mod lookup;
pub mod settings;

pub use callbacks::{Callback, CallbackRegistry, UpdateHandle};
pub use lookup::{lookup, resolve, SettingPath};
pub use settings::ProcessSettings;
