//! Path lookup and last-match-wins resolution.

use std::fmt;

use crate::document::Document;
use crate::targeting::TargetingContext;
use crate::value::{Map, Value};

/// Navigate `path` through nested maps.
///
/// `None` means some key along the way is missing or a non-map was hit.
/// A present key holding `null` is a successful lookup yielding `Value::Null`.
pub fn lookup<'a, S: AsRef<str>>(settings: &'a Map, path: &[S]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = settings.get(first.as_ref())?;
    for key in rest {
        current = current.as_map()?.get(key.as_ref())?;
    }
    Some(current)
}

/// Scan every active layer in order; the last successful lookup wins.
///
/// No short-circuit: a later active layer always overrides an earlier one.
pub fn resolve<'a, S: AsRef<str>>(
    document: &'a Document,
    context: &TargetingContext,
    path: &[S],
) -> Option<&'a Value> {
    let mut result = None;
    for layer in document.data_layers() {
        if !context.matches(layer) {
            continue;
        }
        if let Some(found) = lookup(&layer.settings, path) {
            result = Some(found);
        }
    }
    result
}

/// Dotted rendering of a setting path, e.g. `honeypot.log_stream`.
pub struct SettingPath<'a, S>(pub &'a [S]);

impl<S: AsRef<str>> fmt::Display for SettingPath<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(key.as_ref())?;
        }
        Ok(())
    }
}
