//! Target predicate matching.
//!
//! # Responsibilities
//! - Decide whether a layer's `target` predicate holds for the runtime context
//! - Recurse through nested maps with required-subset semantics
//! - Interpret list predicates as one-of membership
//!
//! # Design Decisions
//! - Asymmetric: the predicate constrains the context, never the reverse.
//!   Extra context keys are ignored; missing ones fail the match.
//! - `null` on either side never matches
//! - Scalars compare by type and value; `1` does not match `1.0`

use crate::document::{DataLayer, Layer};
use crate::value::{Map, Value};

/// Returns true if `context` satisfies `predicate`.
pub fn deep_match(predicate: &Value, context: &Value) -> bool {
    match (predicate, context) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::List(options), _) => options.iter().any(|option| option == context),
        (Value::Map(required), Value::Map(actual)) => map_contains(required, actual),
        (Value::Map(_), _) => false,
        _ => predicate == context,
    }
}

/// Every key of `required` must exist in `actual` with a deep-matching value.
pub fn map_contains(required: &Map, actual: &Map) -> bool {
    required.iter().all(|(key, expected)| {
        actual
            .get(key)
            .map(|found| deep_match(expected, found))
            .unwrap_or(false)
    })
}

/// Runtime facts that layer targets are tested against.
///
/// Fixed for the lifetime of a resolver; reloads never touch it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TargetingContext {
    facts: Map,
}

impl TargetingContext {
    pub fn new(facts: Map) -> Self {
        Self { facts }
    }

    /// Build from a decoded value. `null` is an empty context; any other
    /// non-map value is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::default()),
            Value::Map(facts) => Some(Self { facts }),
            _ => None,
        }
    }

    pub fn facts(&self) -> &Map {
        &self.facts
    }

    /// Returns true if the data layer applies to this context.
    pub fn matches(&self, layer: &DataLayer) -> bool {
        match &layer.target {
            None => true,
            Some(target) => map_contains(target, &self.facts),
        }
    }

    /// Metadata layers are never active.
    pub fn is_active(&self, layer: &Layer) -> bool {
        layer.as_data().map(|data| self.matches(data)).unwrap_or(false)
    }
}

impl From<Map> for TargetingContext {
    fn from(facts: Map) -> Self {
        Self::new(facts)
    }
}
