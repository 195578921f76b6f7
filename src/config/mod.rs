//! Bootstrap configuration subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap file (TOML)
//!     → loader.rs (parse & validate)
//!     → SettingsConfig (document path, format, targeting context, watch options)
//!     → ProcessSettings::from_config
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - The targeting context lives here because it is fixed for the process lifetime

pub mod loader;
pub mod schema;

pub use loader::{load_config, parse_config};
pub use schema::{SettingsConfig, WatchConfig};
