// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine registry access.
//!
//! A [`RegistryHive`] is a tree of keys, each holding named string values. Paths
//! use `\` as separator and are matched without regard to case, as the Windows
//! registry does.

use crate::domain::Result;

/// A machine-wide tree of string values.
pub trait RegistryHive: Send + Sync {
    /// Returns a short name used in logs and errors.
    fn name(&self) -> &str;

    /// Lists the immediate subkeys of `path`. A missing path has no subkeys.
    fn subkeys(&self, path: &str) -> Result<Vec<String>>;

    /// Lists the values stored directly under `path` as `(name, data)` pairs.
    fn values(&self, path: &str) -> Result<Vec<(String, String)>>;

    /// Reads one value.
    fn get_value(&self, path: &str, name: &str) -> Result<Option<String>>;

    /// Writes one value, creating `path` if needed.
    fn set_value(&self, path: &str, name: &str, data: &str) -> Result<()>;

    /// Removes one value if present.
    fn delete_value(&self, path: &str, name: &str) -> Result<()>;

    /// Removes `path` and everything below it if present.
    fn delete_tree(&self, path: &str) -> Result<()>;
}

/// Joins registry path segments with `\`.
pub fn join_registry_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}\\{}", parent.trim_end_matches('\\'), child)
    }
}
