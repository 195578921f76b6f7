//! Layer shapes.

use serde::Serialize;

use crate::error::{Result, SettingsError};
use crate::value::{Map, Value};

/// Named settings block, optionally restricted by a target predicate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataLayer {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Map>,
    pub settings: Map,
}

/// Terminal marker closing a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub version: i64,
    pub end: bool,
}

/// One entry of a settings document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Layer {
    Data(DataLayer),
    Metadata(Metadata),
}

impl Layer {
    pub fn as_data(&self) -> Option<&DataLayer> {
        match self {
            Layer::Data(data) => Some(data),
            Layer::Metadata(_) => None,
        }
    }

    pub fn as_metadata(&self) -> Option<&Metadata> {
        match self {
            Layer::Metadata(meta) => Some(meta),
            Layer::Data(_) => None,
        }
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self, Layer::Metadata(_))
    }
}

/// Fields of one decoded layer map, before shape validation.
///
/// Accepts both the flat form (`name`, `version`, `end`) and the legacy
/// form (`filename`, `meta: { version, END }`). Explicit nulls count as
/// absent.
#[derive(Debug, Default)]
pub(crate) struct RawLayer<'a> {
    pub name: Option<&'a Value>,
    pub target: Option<&'a Value>,
    pub settings: Option<&'a Value>,
    pub version: Option<&'a Value>,
    pub end: Option<&'a Value>,
}

impl<'a> RawLayer<'a> {
    pub fn from_value(index: usize, value: &'a Value) -> Result<Self> {
        let map = value.as_map().ok_or_else(|| {
            SettingsError::invalid_layer(index, format!("expected a map, found {} => {}", value.kind(), value))
        })?;

        let field = move |key: &str| map.get(key).filter(|v| !v.is_null());

        let meta = match field("meta") {
            None => None,
            Some(Value::Map(meta)) => Some(meta),
            Some(other) => {
                return Err(SettingsError::invalid_layer(
                    index,
                    format!("meta must be a map, found {} => {}", other.kind(), value),
                ))
            }
        };
        let meta_field = move |key: &str| meta.and_then(|m| m.get(key)).filter(|v| !v.is_null());

        Ok(Self {
            name: field("name").or_else(|| field("filename")),
            target: field("target"),
            settings: field("settings"),
            version: field("version").or_else(|| meta_field("version")),
            end: field("end")
                .or_else(|| meta_field("END"))
                .or_else(|| meta_field("end")),
        })
    }

    pub fn has_metadata(&self) -> bool {
        self.version.is_some() || self.end.is_some()
    }

    pub fn has_data(&self) -> bool {
        self.name.is_some() || self.target.is_some() || self.settings.is_some()
    }
}
