// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings document formats.

mod json;
mod xml;
#[cfg(feature = "yaml")]
mod yaml;

pub use json::JsonSettingsFormat;
pub use xml::{XmlSettingsFormat, EMPTY_SETTINGS_DOCUMENT};
#[cfg(feature = "yaml")]
pub use yaml::YamlSettingsFormat;

use crate::domain::{ConfigError, Result};
use crate::ports::{SettingsFormat, SettingsMap};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// Picks the format for a settings file from its extension.
///
/// `.json` is JSON, `.yaml`/`.yml` is YAML when the `yaml` feature is enabled,
/// and anything else (`.config`, `.xml`, no extension) is XML.
pub fn format_for_path(path: &Path) -> Arc<dyn SettingsFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    if JsonSettingsFormat.supports_extension(ext) {
        return Arc::new(JsonSettingsFormat);
    }
    #[cfg(feature = "yaml")]
    if YamlSettingsFormat.supports_extension(ext) {
        return Arc::new(YamlSettingsFormat);
    }
    Arc::new(XmlSettingsFormat)
}

/// Splits every key on `.` and nests the segments into a JSON object tree.
///
/// A key that is both a value and a parent of other keys (`a` and `a.b`) cannot
/// be represented and is rejected.
pub(crate) fn nest(settings: &SettingsMap) -> Result<Value> {
    let mut root = Map::new();
    for (key, value) in settings {
        let segments: Vec<&str> = key.segments().collect();
        let (leaf, parents) = segments
            .split_last()
            .ok_or_else(|| ConfigError::source_error("hierarchical", "empty key"))?;

        let mut node = &mut root;
        for segment in parents {
            let child = node
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            node = match child {
                Value::Object(map) => map,
                _ => return Err(conflict(key.as_str())),
            };
        }
        if node.contains_key(*leaf) {
            return Err(conflict(key.as_str()));
        }
        node.insert(leaf.to_string(), Value::String(value.clone()));
    }
    Ok(Value::Object(root))
}

fn conflict(key: &str) -> ConfigError {
    ConfigError::source_error(
        "hierarchical",
        format!("key '{}' overlaps another key's value and cannot be nested", key),
    )
}
