//! Settings document subsystem.
//!
//! # Data Flow
//! ```text
//! settings file (YAML/JSON)
//!     → loader.rs (read & decode into Value)
//!     → validation.rs (layer shapes, terminal metadata)
//!     → Document (validated, immutable)
//!     → shared via Arc by every resolver read
//! ```
//!
//! # Design Decisions
//! - A Document is immutable once built; reloads build a new one
//! - Layer order is significant: later layers override earlier ones
//! - Exactly one metadata layer, always last

pub mod layer;
pub mod loader;
pub mod validation;

pub use layer::{DataLayer, Layer, Metadata};
pub use loader::{load_document, parse_document, DocumentFormat};

use crate::error::{Result, SettingsError};
use crate::value::Value;

/// Validated, ordered sequence of layers ending in a terminal metadata layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    layers: Vec<Layer>,
    metadata: Metadata,
}

impl Document {
    /// Validate a decoded tree and build a document from it.
    pub fn from_value(value: &Value) -> Result<Self> {
        let layers = validation::validate_document(value)?;
        Self::from_layers(layers)
    }

    /// Build a document from already-shaped layers, re-checking layer names
    /// and the terminal rule.
    pub fn from_layers(layers: Vec<Layer>) -> Result<Self> {
        for (index, layer) in layers.iter().enumerate() {
            match layer {
                Layer::Data(data) if data.name.is_empty() => {
                    return Err(SettingsError::invalid_layer(index, "a layer must have a name and settings"));
                }
                Layer::Metadata(_) if index + 1 != layers.len() => {
                    return Err(SettingsError::invalid_layer(
                        index,
                        "metadata layer must be the final layer",
                    ));
                }
                _ => {}
            }
        }
        let metadata = match layers.last() {
            Some(Layer::Metadata(meta)) if meta.end => *meta,
            _ => {
                return Err(SettingsError::invalid_document(
                    validation::MISSING_TERMINAL_METADATA,
                ))
            }
        };
        Ok(Self { layers, metadata })
    }

    /// All layers, terminal metadata included.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Data layers in document order.
    pub fn data_layers(&self) -> impl Iterator<Item = &DataLayer> {
        self.layers.iter().filter_map(Layer::as_data)
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn version(&self) -> i64 {
        self.metadata.version
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}
