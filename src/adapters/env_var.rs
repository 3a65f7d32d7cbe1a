// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment-derived key-value store.
//!
//! This module provides a read-only store whose values come from environment
//! variables, translated into setting keys by an [`EnvironmentVariableMapping`].
//! The same store type backs both the process environment and `.env` files.

use super::env_mapping::EnvironmentVariableMapping;
use crate::domain::{ProtectionLevel, Result, SettingKey};
use crate::ports::{EnvironmentReader, KeyValueStore};
use std::collections::HashMap;
use std::fmt;

/// Maximum length for environment variable keys (prevents DoS)
const MAX_ENV_KEY_LEN: usize = 512;

/// Maximum length for environment variable values (prevents DoS)
const MAX_ENV_VALUE_LEN: usize = 1048576; // 1MB

/// Returns `true` if a variable is small enough to accept.
pub(crate) fn within_limits(key: &str, value: &str) -> bool {
    if key.len() > MAX_ENV_KEY_LEN || value.len() > MAX_ENV_VALUE_LEN {
        tracing::debug!(
            "Skipping oversized environment variable: key_len={}, value_len={} (max key={}, max value={})",
            key.len(),
            value.len(),
            MAX_ENV_KEY_LEN,
            MAX_ENV_VALUE_LEN
        );
        return false;
    }
    true
}

/// A read-only store over a snapshot of environment variables.
///
/// Lookups go through the mapping: the setting key finds its variable, and the
/// variable's value is returned. Protection levels are ignored because the
/// values were never encrypted. There is no write side; the type does not
/// implement [`WritableKeyValueStore`](crate::ports::WritableKeyValueStore).
///
/// # Examples
///
/// ```rust
/// use instancecfg::adapters::{EnvironmentKeyValueStore, EnvironmentVariableMapping};
/// use instancecfg::domain::ProtectionLevel;
/// use instancecfg::ports::{KeyValueStore, MapEnvironment};
///
/// let mapping = EnvironmentVariableMapping::new().required("AGENT_PORT", "Agent.Port");
/// let env = MapEnvironment::new().with_var("AGENT_PORT", "10933");
///
/// let store = EnvironmentKeyValueStore::from_environment(&env, mapping);
/// assert_eq!(store.get("agent.port", ProtectionLevel::None).unwrap().as_deref(), Some("10933"));
/// ```
pub struct EnvironmentKeyValueStore {
    name: String,
    mapping: EnvironmentVariableMapping,
    values: HashMap<String, String>,
}

impl EnvironmentKeyValueStore {
    /// Snapshots every mapped variable from `environment`.
    pub fn from_environment(
        environment: &dyn EnvironmentReader,
        mapping: EnvironmentVariableMapping,
    ) -> Self {
        let values = read_mapped_variables(environment, &mapping);
        tracing::debug!(
            "Loaded {} of {} mapped environment variables",
            values.len(),
            mapping.mappings().len()
        );
        Self {
            name: "environment".to_string(),
            mapping,
            values,
        }
    }

    /// Creates a store over variables that were read elsewhere, such as a `.env` file.
    ///
    /// Variables the mapping does not declare are dropped with a warning.
    pub fn from_values(
        name: impl Into<String>,
        values: HashMap<String, String>,
        mapping: EnvironmentVariableMapping,
    ) -> Self {
        let name = name.into();
        let values = values
            .into_iter()
            .filter(|(variable, _)| {
                let supported = mapping.is_supported(variable);
                if !supported {
                    tracing::warn!("Ignoring unsupported variable '{}' from {}", variable, name);
                }
                supported
            })
            .collect();
        Self {
            name,
            mapping,
            values,
        }
    }

    /// Returns the variables held by this store.
    pub fn variables(&self) -> &HashMap<String, String> {
        &self.values
    }

    /// Returns the mapping this store reads through.
    pub fn mapping(&self) -> &EnvironmentVariableMapping {
        &self.mapping
    }

    /// Returns the required variables this store lacks.
    pub fn missing_required(&self) -> Vec<String> {
        self.mapping.missing_required(&self.values)
    }
}

/// Reads the declared variables from `environment`, skipping unset and oversized ones.
pub(crate) fn read_mapped_variables(
    environment: &dyn EnvironmentReader,
    mapping: &EnvironmentVariableMapping,
) -> HashMap<String, String> {
    mapping
        .supported_variables()
        .filter_map(|variable| {
            environment
                .var(variable)
                .filter(|value| within_limits(variable, value))
                .map(|value| (variable.to_string(), value))
        })
        .collect()
}

impl fmt::Debug for EnvironmentKeyValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut variables: Vec<&str> = self.values.keys().map(String::as_str).collect();
        variables.sort_unstable();
        f.debug_struct("EnvironmentKeyValueStore")
            .field("name", &self.name)
            .field("variables", &variables)
            .finish()
    }
}

impl KeyValueStore for EnvironmentKeyValueStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, key: &str, _protection: ProtectionLevel) -> Result<Option<String>> {
        Ok(self
            .mapping
            .for_setting(key)
            .and_then(|m| self.values.get(&m.variable))
            .cloned())
    }

    fn keys(&self) -> Result<Vec<SettingKey>> {
        Ok(self
            .mapping
            .mappings()
            .iter()
            .filter(|m| self.values.contains_key(&m.variable))
            .map(|m| SettingKey::from(m.setting.as_str()))
            .collect())
    }
}
