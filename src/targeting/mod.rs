//! Targeting subsystem.
//!
//! # Data Flow
//! ```text
//! TargetingContext (fixed at resolver construction)
//!     + layer.target (from the current Document)
//!     → matcher.rs (deep required-subset match)
//!     → active / inactive
//! ```

pub mod matcher;

pub use matcher::{deep_match, map_contains, TargetingContext};
