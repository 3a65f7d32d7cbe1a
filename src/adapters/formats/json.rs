// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON settings documents.

use super::nest;
use crate::domain::{ConfigError, Result, SettingKey};
use crate::ports::{SettingsFormat, SettingsMap};
use serde_json::{Map, Value};

/// Flat `{"key": "value"}` documents; nested objects for export.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSettingsFormat;

impl SettingsFormat for JsonSettingsFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn parse_flat(&self, content: &str) -> Result<SettingsMap> {
        if content.trim().is_empty() {
            return Ok(SettingsMap::new());
        }
        let document: Map<String, Value> = serde_json::from_str(content)
            .map_err(|e| ConfigError::parse("invalid JSON settings document", e))?;

        let mut settings = SettingsMap::new();
        for (key, value) in document {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s,
                Value::Bool(_) | Value::Number(_) => value.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(ConfigError::ParseError {
                        message: format!(
                            "key '{}' holds a nested value; nested JSON settings can only be written",
                            key
                        ),
                        source: None,
                    })
                }
            };
            settings.insert(SettingKey::from(key), text);
        }
        Ok(settings)
    }

    fn render_flat(&self, settings: &SettingsMap) -> Result<String> {
        let document: Map<String, Value> = settings
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), Value::String(v.clone())))
            .collect();
        serde_json::to_string_pretty(&document)
            .map_err(|e| ConfigError::parse("failed to render JSON settings", e))
    }

    fn render_hierarchical(&self, settings: &SettingsMap) -> Result<String> {
        serde_json::to_string_pretty(&nest(settings)?)
            .map_err(|e| ConfigError::parse("failed to render JSON settings", e))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}
