// SPDX-License-Identifier: MIT OR Apache-2.0

//! Environment variable access.
//!
//! Strategies read variables through [`EnvironmentReader`] so that tests can
//! supply a fixed environment instead of mutating the process.

use std::collections::HashMap;

/// Read access to environment variables.
pub trait EnvironmentReader: Send + Sync {
    /// Returns the value of `name`, or `None` if unset or not valid Unicode.
    fn var(&self, name: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessEnvironment;

impl EnvironmentReader for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed environment.
///
/// # Examples
///
/// ```
/// use instancecfg::ports::{EnvironmentReader, MapEnvironment};
///
/// let env = MapEnvironment::new().with_var("SERVER_URL", "https://example.com");
/// assert_eq!(env.var("SERVER_URL").as_deref(), Some("https://example.com"));
/// assert_eq!(env.var("OTHER"), None);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MapEnvironment {
    vars: HashMap<String, String>,
}

impl MapEnvironment {
    /// Creates an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable.
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvironmentReader for MapEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

/// Interprets an activation marker value. Accepts the usual truthy spellings.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthy_values() {
        for v in ["true", "TRUE", "yes", "1", "on", " On "] {
            assert!(is_truthy(v), "{} should be truthy", v);
        }
        for v in ["false", "0", "", "no", "enabled"] {
            assert!(!is_truthy(v), "{} should not be truthy", v);
        }
    }

    #[test]
    fn test_process_environment_reads_path() {
        assert!(ProcessEnvironment.var("INSTANCECFG_DEFINITELY_UNSET_VARIABLE").is_none());
    }
}
