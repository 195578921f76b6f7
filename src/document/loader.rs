//! Settings document loading from disk.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::{Result, SettingsError};
use crate::value::Value;

/// Structured-text encoding of a settings document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Yaml,
    Json,
}

impl DocumentFormat {
    /// Pick the format from the file extension; anything but `.json` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }

    /// Decode text into a value tree.
    pub fn decode(self, content: &str) -> Result<Value> {
        match self {
            DocumentFormat::Yaml => Ok(serde_yaml::from_str(content)?),
            DocumentFormat::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// Decode and validate a settings document held in memory.
pub fn parse_document(content: &str, format: DocumentFormat) -> Result<Document> {
    let value = format.decode(content)?;
    Document::from_value(&value)
}

/// Read, decode and validate a settings document from disk.
pub fn load_document(path: &Path, format: DocumentFormat) -> Result<Document> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, format)
}
