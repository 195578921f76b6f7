//! Document validation.
//!
//! # Responsibilities
//! - Classify each layer as metadata-shaped or data-shaped, never both or neither
//! - Check field types (`settings`/`target` maps, integer `version`, bool `end`)
//! - Require exactly one metadata layer, last, with `end: true`
//!
//! # Design Decisions
//! - Fails on the first violation; no partially valid document is ever built
//! - Errors carry the offending index and the layer rendered as JSON

use crate::document::layer::{DataLayer, Layer, Metadata, RawLayer};
use crate::error::{Result, SettingsError};
use crate::value::{Map, Value};

pub(crate) const MISSING_TERMINAL_METADATA: &str =
    "missing terminal metadata: the last layer must be a metadata layer with end: true";

/// Validate a decoded document and build its layers.
pub fn validate_document(value: &Value) -> Result<Vec<Layer>> {
    let items = value.as_list().ok_or_else(|| {
        SettingsError::invalid_document(format!(
            "document must be a list of layers, found {}",
            value.kind()
        ))
    })?;

    let mut layers = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let layer = validate_layer(index, item)?;
        if layer.is_metadata() && index + 1 != items.len() {
            return Err(SettingsError::invalid_layer(
                index,
                format!("metadata layer must be the final layer => {}", item),
            ));
        }
        layers.push(layer);
    }

    match layers.last() {
        Some(Layer::Metadata(Metadata { end: true, .. })) => Ok(layers),
        _ => Err(SettingsError::invalid_document(MISSING_TERMINAL_METADATA)),
    }
}

/// Validate the shape of a single layer.
pub fn validate_layer(index: usize, value: &Value) -> Result<Layer> {
    let raw = RawLayer::from_value(index, value)?;

    if raw.has_metadata() {
        if raw.has_data() {
            return Err(SettingsError::invalid_layer(
                index,
                format!("a layer must only have settings or metadata, not both => {}", value),
            ));
        }
        return metadata_layer(index, &raw, value).map(Layer::Metadata);
    }

    data_layer(index, &raw, value).map(Layer::Data)
}

fn metadata_layer(index: usize, raw: &RawLayer<'_>, value: &Value) -> Result<Metadata> {
    let version = match raw.version {
        None => 0,
        Some(v) => v.as_i64().ok_or_else(|| {
            SettingsError::invalid_layer(index, format!("version must be an integer => {}", value))
        })?,
    };
    let end = match raw.end {
        None => false,
        Some(v) => v.as_bool().ok_or_else(|| {
            SettingsError::invalid_layer(index, format!("end must be a bool => {}", value))
        })?,
    };
    Ok(Metadata { version, end })
}

fn data_layer(index: usize, raw: &RawLayer<'_>, value: &Value) -> Result<DataLayer> {
    let name = raw.name.and_then(Value::as_str).unwrap_or_default();
    let settings = match raw.settings {
        Some(settings) if !name.is_empty() => settings,
        _ => {
            return Err(SettingsError::invalid_layer(
                index,
                format!("a layer must have a name and settings => {}", value),
            ))
        }
    };

    let settings = expect_map(index, "settings", settings, value)?;
    let target = raw
        .target
        .map(|t| expect_map(index, "target", t, value))
        .transpose()?;

    Ok(DataLayer {
        name: name.to_string(),
        target,
        settings,
    })
}

fn expect_map(index: usize, field: &str, node: &Value, layer: &Value) -> Result<Map> {
    node.as_map().cloned().ok_or_else(|| {
        SettingsError::invalid_layer(
            index,
            format!("{} must be a map, found {} => {}", field, node.kind(), layer),
        )
    })
}
