// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML settings documents.

use super::nest;
use crate::domain::{ConfigError, Result, SettingKey};
use crate::ports::{SettingsFormat, SettingsMap};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Flat `key: value` YAML documents; nested mappings for export.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSettingsFormat;

fn scalar_to_string(key: &str, value: Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Bool(b) => Ok(Some(b.to_string())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => Err(ConfigError::ParseError {
            message: format!(
                "key '{}' holds a nested value; nested YAML settings can only be written",
                key
            ),
            source: None,
        }),
    }
}

impl SettingsFormat for YamlSettingsFormat {
    fn name(&self) -> &str {
        "yaml"
    }

    fn parse_flat(&self, content: &str) -> Result<SettingsMap> {
        if content.trim().is_empty() {
            return Ok(SettingsMap::new());
        }
        let document: BTreeMap<String, Value> = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::parse("invalid YAML settings document", e))?;

        let mut settings = SettingsMap::new();
        for (key, value) in document {
            if let Some(text) = scalar_to_string(&key, value)? {
                settings.insert(SettingKey::from(key), text);
            }
        }
        Ok(settings)
    }

    fn render_flat(&self, settings: &SettingsMap) -> Result<String> {
        let document: BTreeMap<&str, &str> = settings
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        serde_yaml::to_string(&document)
            .map_err(|e| ConfigError::parse("failed to render YAML settings", e))
    }

    fn render_hierarchical(&self, settings: &SettingsMap) -> Result<String> {
        serde_yaml::to_string(&nest(settings)?)
            .map_err(|e| ConfigError::parse("failed to render YAML settings", e))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}
