//! Layered process settings with targeting and hot reload.
//!
//! # Architecture Overview
//!
//! ```text
//!   settings file (YAML/JSON)           TargetingContext (fixed per process)
//!          │                                        │
//!          ▼                                        │
//!   ┌──────────────┐   Arc<Document>   ┌────────────▼───────────┐
//!   │   document   │──────────────────▶│        resolver        │◀── get / get_safe
//!   │ loader +     │                   │ targeting::matcher +   │
//!   │ validation   │                   │ lookup (last wins)     │
//!   └──────▲───────┘                   └────────────▲───────────┘
//!          │ reload                                 │ atomic swap
//!   ┌──────┴───────────────────────────────────────┴───────────┐
//!   │ reload: notifier → reload task → dispatcher → callbacks   │
//!   └───────────────────────────────────────────────────────────┘
//!                         global: optional process-wide handle
//! ```
//!
//! ```no_run
//! use process_settings::{ProcessSettings, TargetingContext, Value};
//!
//! # fn main() -> process_settings::Result<()> {
//! let mut facts = process_settings::value::Map::new();
//! facts.insert("app".into(), Value::from("telecom"));
//!
//! let settings = ProcessSettings::from_file("config/process_settings.yml", TargetingContext::new(facts))?;
//! let stream = settings.get(&["honeypot", "log_stream"])?;
//! # let _ = stream;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod global;
pub mod reload;
pub mod resolver;
pub mod targeting;
pub mod value;

pub use config::SettingsConfig;
pub use document::{Document, DocumentFormat, Layer};
pub use error::{Result, SettingsError};
pub use reload::{ChangeNotifier, WatchEvent, WatchStatus};
pub use resolver::{ProcessSettings, UpdateHandle};
pub use targeting::TargetingContext;
pub use value::Value;
