// SPDX-License-Identifier: MIT OR Apache-2.0

//! A registry hive held in memory.

use crate::domain::{ConfigError, Result};
use crate::ports::RegistryHive;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default, Clone)]
struct Node {
    path: String,
    values: BTreeMap<String, (String, String)>,
}

/// A [`RegistryHive`] for tests and for hosts without a registry.
///
/// Paths and value names are matched without regard to case; the casing of
/// the first write is kept.
#[derive(Debug, Default)]
pub struct MemoryHive {
    nodes: RwLock<BTreeMap<String, Node>>,
}

fn normalize(path: &str) -> String {
    path.trim_matches('\\').to_lowercase()
}

fn insert_value(nodes: &mut BTreeMap<String, Node>, path: &str, name: &str, data: &str) {
    let node = nodes.entry(normalize(path)).or_insert_with(|| Node {
        path: path.trim_matches('\\').to_string(),
        values: BTreeMap::new(),
    });
    let entry = node
        .values
        .entry(name.to_lowercase())
        .or_insert_with(|| (name.to_string(), String::new()));
    entry.1 = data.to_string();
}

impl MemoryHive {
    /// Creates an empty hive.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, creating the key as needed.
    pub fn with_value(mut self, path: &str, name: &str, data: &str) -> Self {
        let nodes = self.nodes.get_mut().unwrap_or_else(PoisonError::into_inner);
        insert_value(nodes, path, name, data);
        self
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .read()
            .map_err(|_| ConfigError::lock_poisoned("memory-hive"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .write()
            .map_err(|_| ConfigError::lock_poisoned("memory-hive"))
    }
}

impl RegistryHive for MemoryHive {
    fn name(&self) -> &str {
        "memory-hive"
    }

    fn subkeys(&self, path: &str) -> Result<Vec<String>> {
        let nodes = self.read()?;
        let prefix = format!("{}\\", normalize(path));
        let mut children: Vec<String> = Vec::new();

        for (key, node) in nodes.iter() {
            let Some(rest) = key.strip_prefix(&prefix) else {
                continue;
            };
            let depth = prefix.matches('\\').count();
            let child = node
                .path
                .trim_matches('\\')
                .split('\\')
                .nth(depth)
                .unwrap_or(rest);
            if !children.iter().any(|c| c.eq_ignore_ascii_case(child)) {
                children.push(child.to_string());
            }
        }
        Ok(children)
    }

    fn values(&self, path: &str) -> Result<Vec<(String, String)>> {
        let nodes = self.read()?;
        Ok(nodes
            .get(&normalize(path))
            .map(|node| node.values.values().cloned().collect())
            .unwrap_or_default())
    }

    fn get_value(&self, path: &str, name: &str) -> Result<Option<String>> {
        let nodes = self.read()?;
        Ok(nodes
            .get(&normalize(path))
            .and_then(|node| node.values.get(&name.to_lowercase()))
            .map(|(_, data)| data.clone()))
    }

    fn set_value(&self, path: &str, name: &str, data: &str) -> Result<()> {
        let mut nodes = self.write()?;
        insert_value(&mut nodes, path, name, data);
        Ok(())
    }

    fn delete_value(&self, path: &str, name: &str) -> Result<()> {
        let mut nodes = self.write()?;
        if let Some(node) = nodes.get_mut(&normalize(path)) {
            node.values.remove(&name.to_lowercase());
        }
        Ok(())
    }

    fn delete_tree(&self, path: &str) -> Result<()> {
        let mut nodes = self.write()?;
        let target = normalize(path);
        let prefix = format!("{}\\", target);
        nodes.retain(|key, _| key != &target && !key.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_value_overwrites_and_keeps_first_casing() {
        let hive = MemoryHive::new()
            .with_value("Software\\Acme", "Name", "x")
            .with_value("SOFTWARE\\ACME", "NAME", "y");
        assert_eq!(hive.values("software\\acme").unwrap(), vec![("Name".to_string(), "y".to_string())]);
    }

    #[test]
    fn test_values_are_case_insensitive() {
        let hive = MemoryHive::new().with_value("Software\\Acme", "Name", "x");
        assert_eq!(
            hive.get_value("SOFTWARE\\acme", "name").unwrap().as_deref(),
            Some("x")
        );
    }

    #[test]
    fn test_subkeys_include_intermediate_keys() {
        let hive = MemoryHive::new()
            .with_value("Software\\Acme\\Agent\\Default", "ConfigurationFilePath", "a")
            .with_value("Software\\Acme\\Agent\\Second", "ConfigurationFilePath", "b");
        assert_eq!(hive.subkeys("Software\\Acme").unwrap(), vec!["Agent"]);
        let mut instances = hive.subkeys("software\\acme\\agent").unwrap();
        instances.sort();
        assert_eq!(instances, vec!["Default", "Second"]);
    }

    #[test]
    fn test_missing_path_is_empty() {
        let hive = MemoryHive::new();
        assert!(hive.subkeys("Nowhere").unwrap().is_empty());
        assert!(hive.values("Nowhere").unwrap().is_empty());
        assert_eq!(hive.get_value("Nowhere", "x").unwrap(), None);
    }

    #[test]
    fn test_delete_tree() {
        let hive = MemoryHive::new()
            .with_value("A\\B", "x", "1")
            .with_value("A\\B\\C", "y", "2")
            .with_value("A\\BB", "z", "3");
        hive.delete_tree("a\\b").unwrap();
        assert!(hive.values("A\\B").unwrap().is_empty());
        assert!(hive.values("A\\B\\C").unwrap().is_empty());
        assert_eq!(hive.values("A\\BB").unwrap().len(), 1);
    }
}
