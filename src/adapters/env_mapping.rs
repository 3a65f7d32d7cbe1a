// SPDX-License-Identifier: MIT OR Apache-2.0

//! The mapping between environment variables and setting keys.
//!
//! An application declares which variables it understands, which setting each
//! one feeds, and which must be present for environment-based configuration
//! to count as complete. Variables outside the mapping are ignored.

use crate::domain::{ConfigError, Result};
use std::collections::HashMap;

/// The variable that switches environment-based configuration on, unless overridden.
pub const DEFAULT_ACTIVATION_VARIABLE: &str = "INSTANCECFG_CONFIGURE_FROM_ENVIRONMENT";

/// One environment variable and the setting it provides.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariableMapping {
    /// The environment variable name, matched exactly
    pub variable: String,
    /// The setting key it provides
    pub setting: String,
    /// Whether configuration is incomplete without it
    pub required: bool,
    /// Whether the value is a secret and must not be logged
    pub sensitive: bool,
}

/// The required/optional variable policy of an application.
///
/// # Examples
///
/// ```
/// use instancecfg::adapters::EnvironmentVariableMapping;
///
/// let mapping = EnvironmentVariableMapping::new()
///     .required("AGENT_SERVER_URL", "Agent.ServerUrl")
///     .optional("AGENT_PORT", "Agent.Port")
///     .sensitive("AGENT_API_KEY", "Agent.ApiKey");
///
/// assert!(mapping.is_supported("AGENT_PORT"));
/// assert_eq!(mapping.required_variables().collect::<Vec<_>>(), vec!["AGENT_SERVER_URL"]);
/// ```
#[derive(Clone, Debug)]
pub struct EnvironmentVariableMapping {
    mappings: Vec<VariableMapping>,
    activation_variable: String,
}

impl Default for EnvironmentVariableMapping {
    fn default() -> Self {
        Self {
            mappings: Vec::new(),
            activation_variable: DEFAULT_ACTIVATION_VARIABLE.to_string(),
        }
    }
}

impl EnvironmentVariableMapping {
    /// Creates an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the marker variable that must be truthy before the process
    /// environment is treated as configuration.
    pub fn activated_by(mut self, variable: impl Into<String>) -> Self {
        self.activation_variable = variable.into();
        self
    }

    /// Returns the activation marker variable.
    pub fn activation_variable(&self) -> &str {
        &self.activation_variable
    }

    fn with(mut self, variable: &str, setting: &str, required: bool, sensitive: bool) -> Self {
        self.mappings.retain(|m| m.variable != variable);
        self.mappings.push(VariableMapping {
            variable: variable.to_string(),
            setting: setting.to_string(),
            required,
            sensitive,
        });
        self
    }

    /// Declares a variable that must be present.
    pub fn required(self, variable: &str, setting: &str) -> Self {
        self.with(variable, setting, true, false)
    }

    /// Declares a variable that may be present.
    pub fn optional(self, variable: &str, setting: &str) -> Self {
        self.with(variable, setting, false, false)
    }

    /// Declares an optional variable holding a secret.
    pub fn sensitive(self, variable: &str, setting: &str) -> Self {
        self.with(variable, setting, false, true)
    }

    /// Returns every declared mapping.
    pub fn mappings(&self) -> &[VariableMapping] {
        &self.mappings
    }

    /// Returns the names of every declared variable.
    pub fn supported_variables(&self) -> impl Iterator<Item = &str> {
        self.mappings.iter().map(|m| m.variable.as_str())
    }

    /// Returns the names of the required variables.
    pub fn required_variables(&self) -> impl Iterator<Item = &str> {
        self.mappings
            .iter()
            .filter(|m| m.required)
            .map(|m| m.variable.as_str())
    }

    /// Returns `true` if `variable` is declared.
    pub fn is_supported(&self, variable: &str) -> bool {
        self.mappings.iter().any(|m| m.variable == variable)
    }

    /// Finds the mapping that provides `setting`, ignoring case.
    pub fn for_setting(&self, setting: &str) -> Option<&VariableMapping> {
        self.mappings
            .iter()
            .find(|m| m.setting.eq_ignore_ascii_case(setting))
    }

    /// Returns the required variables absent from `values`, in declaration order.
    pub fn missing_required(&self, values: &HashMap<String, String>) -> Vec<String> {
        self.required_variables()
            .filter(|v| !values.contains_key(*v))
            .map(str::to_string)
            .collect()
    }

    /// Fails with `MissingEnvironmentVariables` unless every required variable is in `values`.
    pub fn validate(&self, values: &HashMap<String, String>) -> Result<()> {
        let names = self.missing_required(values);
        if names.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingEnvironmentVariables { names })
        }
    }
}
