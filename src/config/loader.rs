//! Bootstrap configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::SettingsConfig;
use crate::error::{Result, SettingsError};

/// Parse bootstrap configuration from TOML text.
pub fn parse_config(content: &str) -> Result<SettingsConfig> {
    let config: SettingsConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate bootstrap configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SettingsConfig> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content)
}

fn validate_config(config: &SettingsConfig) -> Result<()> {
    if config.path.as_os_str().is_empty() {
        return Err(SettingsError::invalid_document("path must not be empty"));
    }
    if config.watch.poll_interval_ms == 0 {
        return Err(SettingsError::invalid_document("watch.poll_interval_ms must be greater than 0"));
    }
    config.targeting_context()?;
    Ok(())
}
