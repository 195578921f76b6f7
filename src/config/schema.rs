//! Bootstrap configuration schema.
//!
//! Describes where the settings document lives and how the resolver should
//! be wired. Every field has a default so a minimal file only names the path.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::document::DocumentFormat;
use crate::error::{Result, SettingsError};
use crate::targeting::TargetingContext;
use crate::value::Value;

/// Root bootstrap configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Path to the settings document.
    pub path: PathBuf,

    /// Document encoding. Inferred from the extension when absent.
    pub format: Option<DocumentFormat>,

    /// Static targeting facts for this process.
    pub context: Value,

    /// Hot reload settings.
    pub watch: WatchConfig,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("config/process_settings.yml"),
            format: None,
            context: Value::Null,
            watch: WatchConfig::default(),
        }
    }
}

impl SettingsConfig {
    /// The `context` table as a targeting context.
    pub fn targeting_context(&self) -> Result<TargetingContext> {
        TargetingContext::from_value(self.context.clone()).ok_or_else(|| {
            SettingsError::invalid_document(format!(
                "context must be a table, found {}",
                self.context.kind()
            ))
        })
    }
}

/// Hot reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Start watching as soon as the resolver is built.
    pub enabled: bool,

    /// Poll interval for platforms without native file events, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            poll_interval_ms: 2000,
        }
    }
}
